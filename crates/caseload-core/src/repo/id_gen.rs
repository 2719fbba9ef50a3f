use chrono::Utc;

/// Generates `<prefix>_<epoch millis>` ids.
///
/// Ids are strictly increasing within one generator and skip any candidate
/// the caller reports as taken, so two adds in the same millisecond still get
/// distinct ids.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_millis: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, prefix: &str, taken: impl Fn(&str) -> bool) -> String {
        let mut millis = Utc::now().timestamp_millis().max(self.last_millis + 1);
        loop {
            let candidate = format!("{}_{}", prefix, millis);
            if !taken(&candidate) {
                self.last_millis = millis;
                return candidate;
            }
            millis += 1;
        }
    }
}
