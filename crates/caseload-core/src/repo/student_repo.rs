use tracing::{debug, info};

use super::id_gen::IdGenerator;
use crate::error::{StoreError, StoreResult};
use crate::filter::StudentFilter;
use crate::models::{NewStudent, Student, StudentId, StudentPatch, Teacher, TeacherId, UserId};
use crate::seed::sample_students;
use crate::storage::{Collection, Storage, StorageBackend};

/// Whether the collections of the current user are in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Loaded,
}

/// Students and teachers of the signed-in user, mirrored to storage.
///
/// Every operation is a no-op while no user is set. Mutations replace the
/// in-memory collection first and then write it through synchronously.
pub struct StudentRepository<B: StorageBackend> {
    storage: Storage<B>,
    user: Option<UserId>,
    state: SessionState,
    students: Vec<Student>,
    teachers: Vec<Teacher>,
    ids: IdGenerator,
    seed_sample_data: bool,
}

impl<B: StorageBackend> StudentRepository<B> {
    pub fn new(backend: B) -> Self {
        Self {
            storage: Storage::new(backend),
            user: None,
            state: SessionState::Unloaded,
            students: Vec::new(),
            teachers: Vec::new(),
            ids: IdGenerator::new(),
            seed_sample_data: true,
        }
    }

    /// Enable or disable writing the sample students on a user's first load.
    pub fn with_sample_data(mut self, enabled: bool) -> Self {
        self.seed_sample_data = enabled;
        self
    }

    pub fn storage(&self) -> &Storage<B> {
        &self.storage
    }

    pub fn current_user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Switch the signed-in user. A different user clears the cache and loads
    /// that user's collections; the same user is a no-op.
    pub fn set_user(&mut self, user: Option<UserId>) -> StoreResult<()> {
        if self.user == user {
            return Ok(());
        }

        debug!(from = ?self.user, to = ?user, "Switching user");
        self.user = user;
        self.state = SessionState::Unloaded;
        self.students.clear();
        self.teachers.clear();

        if self.user.is_some() {
            self.load()?;
        }
        Ok(())
    }

    /// Load both collections of the current user.
    pub fn load(&mut self) -> StoreResult<()> {
        if self.user.is_none() {
            return Ok(());
        }
        self.load_students()?;
        self.load_teachers()?;
        self.state = SessionState::Loaded;
        Ok(())
    }

    /// Read the students of the current user.
    ///
    /// The very first load for a user (nothing stored yet) writes the sample
    /// students, so later loads never seed again.
    pub fn load_students(&mut self) -> StoreResult<()> {
        let Some(user) = self.user.clone() else {
            return Ok(());
        };

        let first_load = !self.storage.has(Collection::Students, &user)?;
        if first_load && self.seed_sample_data {
            let seeded = sample_students();
            self.storage.set(Collection::Students, &user, &seeded)?;
            info!(user = %user, count = seeded.len(), "Seeded sample students");
            self.students = seeded;
        } else {
            self.students = self.storage.get(Collection::Students, &user, Vec::new())?;
        }

        debug!(user = %user, count = self.students.len(), "Loaded students");
        Ok(())
    }

    /// Read the teachers of the current user. Defaults to an empty list.
    pub fn load_teachers(&mut self) -> StoreResult<()> {
        let Some(user) = self.user.clone() else {
            return Ok(());
        };

        self.teachers = self.storage.get(Collection::Teachers, &user, Vec::new())?;
        debug!(user = %user, count = self.teachers.len(), "Loaded teachers");
        Ok(())
    }

    /// The current user, loading their collections first if needed.
    fn session_user(&mut self) -> StoreResult<Option<UserId>> {
        if self.user.is_some() && self.state == SessionState::Unloaded {
            self.load()?;
        }
        Ok(self.user.clone())
    }

    fn persist_students(&mut self, user: &UserId) -> StoreResult<()> {
        self.storage.set(Collection::Students, user, &self.students)
    }

    fn persist_teachers(&mut self, user: &UserId) -> StoreResult<()> {
        self.storage.set(Collection::Teachers, user, &self.teachers)
    }

    fn ensure_teacher_exists(&self, teacher: Option<&TeacherId>) -> StoreResult<()> {
        match teacher {
            Some(id) if self.get_teacher_by_id(id).is_none() => Err(StoreError::UnknownTeacher(id.clone())),
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Students
    // =========================================================================

    pub fn get_student_by_id(&self, id: &StudentId) -> Option<&Student> {
        self.students.iter().find(|s| &s.id == id)
    }

    /// Students passing the dashboard filter.
    pub fn filtered_students(&self, filter: &StudentFilter) -> Vec<&Student> {
        filter.apply(&self.students)
    }

    /// Create a student with a fresh `student_<millis>` id.
    /// Returns `None` when no user is signed in.
    pub fn add_student(&mut self, new_student: NewStudent) -> StoreResult<Option<Student>> {
        let Some(user) = self.session_user()? else {
            return Ok(None);
        };
        self.ensure_teacher_exists(new_student.teacher_assigned.as_ref())?;

        let students = &self.students;
        let id = self
            .ids
            .next("student", |candidate| students.iter().any(|s| s.id.as_str() == candidate));
        let student = new_student.into_student(StudentId::new(id));

        self.students.push(student.clone());
        self.persist_students(&user)?;

        info!(user = %user, id = %student.id, "Added student");
        Ok(Some(student))
    }

    /// Merge `patch` into the student with `id`.
    /// Returns the updated record, or `None` if there is no user or no such student.
    pub fn update_student(&mut self, id: &StudentId, patch: StudentPatch) -> StoreResult<Option<Student>> {
        let Some(user) = self.session_user()? else {
            return Ok(None);
        };
        if let Some(teacher) = &patch.teacher_assigned {
            self.ensure_teacher_exists(teacher.as_ref())?;
        }

        let Some(student) = self.students.iter_mut().find(|s| &s.id == id) else {
            debug!(id = %id, "Update skipped, student not found");
            return Ok(None);
        };
        student.apply(patch);
        let updated = student.clone();

        self.persist_students(&user)?;
        info!(user = %user, id = %id, "Updated student");
        Ok(Some(updated))
    }

    /// Set or clear the teacher of a student.
    pub fn assign_teacher(&mut self, id: &StudentId, teacher: Option<TeacherId>) -> StoreResult<Option<Student>> {
        self.update_student(id, StudentPatch::assign_teacher(teacher))
    }

    /// Remove the student with `id`. Returns whether a record was removed.
    pub fn delete_student(&mut self, id: &StudentId) -> StoreResult<bool> {
        let Some(user) = self.session_user()? else {
            return Ok(false);
        };

        let before = self.students.len();
        self.students.retain(|s| &s.id != id);
        if self.students.len() == before {
            return Ok(false);
        }

        self.persist_students(&user)?;
        info!(user = %user, id = %id, "Deleted student");
        Ok(true)
    }

    // =========================================================================
    // Teachers
    // =========================================================================

    pub fn get_teacher_by_id(&self, id: &TeacherId) -> Option<&Teacher> {
        self.teachers.iter().find(|t| &t.id == id)
    }

    pub fn teacher_name(&self, id: &TeacherId) -> Option<&str> {
        self.get_teacher_by_id(id).map(|t| t.name.as_str())
    }

    pub fn students_assigned_to(&self, teacher: &TeacherId) -> Vec<&Student> {
        self.students.iter().filter(|s| s.is_assigned_to(teacher)).collect()
    }

    /// Create a teacher with a fresh `teacher_<millis>` id.
    /// Returns `None` when no user is signed in.
    pub fn add_teacher(&mut self, name: impl Into<String>) -> StoreResult<Option<Teacher>> {
        let Some(user) = self.session_user()? else {
            return Ok(None);
        };

        let teachers = &self.teachers;
        let id = self
            .ids
            .next("teacher", |candidate| teachers.iter().any(|t| t.id.as_str() == candidate));
        let teacher = Teacher::new(TeacherId::new(id), name);

        self.teachers.push(teacher.clone());
        self.persist_teachers(&user)?;

        info!(user = %user, id = %teacher.id, "Added teacher");
        Ok(Some(teacher))
    }

    /// Remove a teacher and clear every student assignment pointing at it.
    ///
    /// Both in-memory collections are updated before anything is written, so a
    /// failed write never leaves a student pointing at the removed teacher.
    /// Students are rewritten only when at least one assignment was cleared.
    /// Returns whether anything changed.
    pub fn delete_teacher(&mut self, id: &TeacherId) -> StoreResult<bool> {
        let Some(user) = self.session_user()? else {
            return Ok(false);
        };

        let before = self.teachers.len();
        self.teachers.retain(|t| &t.id != id);
        let removed = self.teachers.len() != before;

        let mut cleared = 0;
        for student in self.students.iter_mut().filter(|s| s.is_assigned_to(id)) {
            student.teacher_assigned = None;
            cleared += 1;
        }

        if removed {
            self.persist_teachers(&user)?;
        }
        if cleared > 0 {
            self.persist_students(&user)?;
        }

        info!(user = %user, id = %id, removed, cleared, "Deleted teacher");
        Ok(removed || cleared > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use serde::de::DeserializeOwned;

    use super::*;
    use crate::filter::LevelFilter;
    use crate::models::DisabilityLevel;
    use crate::storage::{FileBackend, MemoryBackend, StorageKey};

    /// Memory storage whose teacher writes fail while `fail_teachers` is set.
    #[derive(Default)]
    struct FailingTeacherWrites {
        inner: MemoryBackend,
        fail_teachers: Rc<Cell<bool>>,
    }

    impl StorageBackend for FailingTeacherWrites {
        fn contains(&self, key: &StorageKey) -> StoreResult<bool> {
            self.inner.contains(key)
        }

        fn read(&self, key: &StorageKey) -> StoreResult<Option<String>> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &StorageKey, value: &str) -> StoreResult<()> {
            if self.fail_teachers.get() && key.collection() == Collection::Teachers {
                let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
                return Err(StoreError::io(std::path::Path::new("teachers.json"), err));
            }
            self.inner.write(key, value)
        }

        fn preserve(&mut self, key: &StorageKey, value: &str) -> StoreResult<()> {
            self.inner.preserve(key, value)
        }
    }

    fn signed_in(user: &str) -> StudentRepository<MemoryBackend> {
        let mut repo = StudentRepository::new(MemoryBackend::new());
        repo.set_user(Some(UserId::from(user))).unwrap();
        repo
    }

    fn stored<T: DeserializeOwned>(repo: &StudentRepository<MemoryBackend>, collection: Collection) -> T {
        let user = repo.current_user().unwrap().clone();
        let raw = repo
            .storage()
            .backend()
            .read(&StorageKey::new(collection, user))
            .unwrap()
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    fn stored_students(repo: &StudentRepository<MemoryBackend>) -> Vec<Student> {
        stored(repo, Collection::Students)
    }

    fn stored_teachers(repo: &StudentRepository<MemoryBackend>) -> Vec<Teacher> {
        stored(repo, Collection::Teachers)
    }

    fn new_student(name: &str) -> NewStudent {
        NewStudent::new(name, 10, "4th Grade", "Dyslexia", DisabilityLevel::Mild)
    }

    // -------------------------------------------------------------------------
    // Session and seeding
    // -------------------------------------------------------------------------

    #[test]
    fn test_no_user_is_a_no_op() {
        let mut repo = StudentRepository::new(MemoryBackend::new());

        assert_eq!(repo.state(), SessionState::Unloaded);
        assert!(repo.add_student(new_student("A")).unwrap().is_none());
        assert!(repo.add_teacher("T").unwrap().is_none());
        assert!(!repo.delete_student(&StudentId::from("1")).unwrap());
        assert!(!repo.delete_teacher(&TeacherId::from("t")).unwrap());
        assert!(repo.update_student(&StudentId::from("1"), StudentPatch::default()).unwrap().is_none());
        repo.load().unwrap();

        assert!(repo.students().is_empty());
        assert!(repo.storage().backend().is_empty());
    }

    #[test]
    fn test_first_load_seeds_and_persists_samples() {
        let repo = signed_in("alice");

        assert_eq!(repo.state(), SessionState::Loaded);
        assert_eq!(repo.students().len(), 6);
        assert!(repo.teachers().is_empty());
        assert_eq!(stored_students(&repo), repo.students());
    }

    #[test]
    fn test_later_loads_do_not_reseed() {
        let mut repo = signed_in("alice");
        for id in ["1", "2", "3", "4", "5", "6"] {
            assert!(repo.delete_student(&StudentId::from(id)).unwrap());
        }
        assert!(repo.students().is_empty());

        repo.load_students().unwrap();
        assert!(repo.students().is_empty());

        repo.set_user(None).unwrap();
        repo.set_user(Some(UserId::from("alice"))).unwrap();
        assert!(repo.students().is_empty());
    }

    #[test]
    fn test_seeding_can_be_disabled() {
        let mut repo = StudentRepository::new(MemoryBackend::new()).with_sample_data(false);
        repo.set_user(Some(UserId::from("u"))).unwrap();

        assert!(repo.students().is_empty());
        assert!(!repo.storage().has(Collection::Students, &UserId::from("u")).unwrap());
    }

    #[test]
    fn test_switching_user_reloads_their_partition() {
        let mut repo = signed_in("alice");
        repo.add_teacher("Ms. Frizzle").unwrap();

        repo.set_user(Some(UserId::from("bob"))).unwrap();
        assert!(repo.teachers().is_empty());
        assert_eq!(repo.students().len(), 6);

        repo.set_user(Some(UserId::from("alice"))).unwrap();
        assert_eq!(repo.teachers().len(), 1);
    }

    #[test]
    fn test_same_user_is_a_no_op() {
        let mut repo = signed_in("alice");
        repo.add_student(new_student("Ava Lee")).unwrap();

        repo.set_user(Some(UserId::from("alice"))).unwrap();
        assert_eq!(repo.state(), SessionState::Loaded);
        assert_eq!(repo.students().len(), 7);
    }

    #[test]
    fn test_corrupt_students_load_as_empty() {
        let mut backend = MemoryBackend::new();
        backend
            .write(&StorageKey::students(&UserId::from("u")), "[{\"broken\":")
            .unwrap();

        let mut repo = StudentRepository::new(backend);
        repo.set_user(Some(UserId::from("u"))).unwrap();

        assert!(repo.students().is_empty());
    }

    #[test]
    fn test_corrupt_students_are_kept_aside_before_overwrite() {
        let key = StorageKey::students(&UserId::from("u"));
        let mut backend = MemoryBackend::new();
        backend.write(&key, "[{\"broken\":").unwrap();

        let mut repo = StudentRepository::new(backend);
        repo.set_user(Some(UserId::from("u"))).unwrap();
        repo.add_student(new_student("Ava Lee")).unwrap();

        assert_eq!(stored_students(&repo).len(), 1);
        assert_eq!(repo.storage().backend().preserved(&key), Some("[{\"broken\":"));
    }

    // -------------------------------------------------------------------------
    // Student CRUD
    // -------------------------------------------------------------------------

    #[test]
    fn test_add_student_round_trips_through_storage() {
        let mut repo = signed_in("alice");

        let created = repo.add_student(new_student("Noah Clark")).unwrap().unwrap();

        assert!(created.id.as_str().starts_with("student_"));
        assert_eq!(repo.get_student_by_id(&created.id), Some(&created));
        assert_eq!(stored_students(&repo).last(), Some(&created));
    }

    #[test]
    fn test_add_students_get_distinct_ids() {
        let mut repo = signed_in("alice");
        let a = repo.add_student(new_student("A")).unwrap().unwrap();
        let b = repo.add_student(new_student("B")).unwrap().unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_update_student_round_trips_through_storage() {
        let mut repo = signed_in("alice");
        let id = StudentId::from("2");

        let updated = repo
            .update_student(
                &id,
                StudentPatch {
                    grade: Some("5th Grade".to_string()),
                    disability_level: Some(DisabilityLevel::Moderate),
                    ..StudentPatch::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Jane Smith");
        assert_eq!(updated.grade, "5th Grade");
        let stored = stored_students(&repo);
        let persisted = stored.iter().find(|s| s.id == id).unwrap();
        assert_eq!(persisted, &updated);
    }

    #[test]
    fn test_update_missing_student_returns_none() {
        let mut repo = signed_in("alice");
        let result = repo
            .update_student(&StudentId::from("nope"), StudentPatch::default())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_student_round_trips_through_storage() {
        let mut repo = signed_in("alice");
        let id = StudentId::from("4");

        assert!(repo.delete_student(&id).unwrap());
        assert!(repo.get_student_by_id(&id).is_none());
        assert!(stored_students(&repo).iter().all(|s| s.id != id));
        assert!(!repo.delete_student(&id).unwrap());
    }

    // -------------------------------------------------------------------------
    // Teachers and assignments
    // -------------------------------------------------------------------------

    #[test]
    fn test_add_teacher_persists() {
        let mut repo = signed_in("alice");
        let teacher = repo.add_teacher("Mr. Rogers").unwrap().unwrap();

        assert!(teacher.id.as_str().starts_with("teacher_"));
        assert_eq!(stored_teachers(&repo), vec![teacher.clone()]);
        assert_eq!(repo.teacher_name(&teacher.id), Some("Mr. Rogers"));
    }

    #[test]
    fn test_assigning_unknown_teacher_is_rejected() {
        let mut repo = signed_in("alice");
        let err = repo
            .assign_teacher(&StudentId::from("1"), Some(TeacherId::from("ghost")))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownTeacher(_)));
        assert!(repo.get_student_by_id(&StudentId::from("1")).unwrap().teacher_assigned.is_none());

        let mut orphan = new_student("Orphaned");
        orphan.teacher_assigned = Some(TeacherId::from("ghost"));
        assert!(repo.add_student(orphan).is_err());
    }

    #[test]
    fn test_delete_teacher_clears_assignments() {
        let mut repo = signed_in("alice");
        let keep = repo.add_teacher("Keep").unwrap().unwrap();
        let gone = repo.add_teacher("Gone").unwrap().unwrap();

        repo.assign_teacher(&StudentId::from("1"), Some(gone.id.clone())).unwrap();
        repo.assign_teacher(&StudentId::from("3"), Some(gone.id.clone())).unwrap();
        repo.assign_teacher(&StudentId::from("5"), Some(keep.id.clone())).unwrap();
        assert_eq!(repo.students_assigned_to(&gone.id).len(), 2);

        assert!(repo.delete_teacher(&gone.id).unwrap());

        assert!(repo.get_teacher_by_id(&gone.id).is_none());
        assert!(repo.students().iter().all(|s| !s.is_assigned_to(&gone.id)));
        assert_eq!(repo.students_assigned_to(&keep.id).len(), 1);

        let stored = stored_students(&repo);
        assert!(stored.iter().all(|s| !s.is_assigned_to(&gone.id)));
        assert_eq!(stored_teachers(&repo), vec![keep]);
    }

    #[test]
    fn test_delete_teacher_clears_assignments_even_if_write_fails() {
        let fail_teachers = Rc::new(Cell::new(false));
        let backend = FailingTeacherWrites {
            fail_teachers: Rc::clone(&fail_teachers),
            ..FailingTeacherWrites::default()
        };
        let mut repo = StudentRepository::new(backend);
        repo.set_user(Some(UserId::from("alice"))).unwrap();
        let teacher = repo.add_teacher("Ms. Park").unwrap().unwrap();
        repo.assign_teacher(&StudentId::from("1"), Some(teacher.id.clone())).unwrap();

        fail_teachers.set(true);
        assert!(repo.delete_teacher(&teacher.id).is_err());

        assert!(repo.get_teacher_by_id(&teacher.id).is_none());
        assert!(repo.students().iter().all(|s| !s.is_assigned_to(&teacher.id)));
    }

    #[test]
    fn test_delete_teacher_without_students_leaves_students_untouched() {
        let mut repo = signed_in("alice");
        let teacher = repo.add_teacher("Solo").unwrap().unwrap();
        let before = repo.storage().backend().clone();

        assert!(repo.delete_teacher(&teacher.id).unwrap());

        let key = StorageKey::students(&UserId::from("alice"));
        assert_eq!(
            repo.storage().backend().read(&key).unwrap(),
            before.read(&key).unwrap()
        );
        assert!(!repo.delete_teacher(&teacher.id).unwrap());
    }

    #[test]
    fn test_filtered_students() {
        let repo = signed_in("alice");
        let filter = StudentFilter::new("smith", LevelFilter::All);
        let names: Vec<&str> = repo.filtered_students(&filter).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Smith"]);
    }

    #[test]
    fn test_file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let user = UserId::from("carol@example.org");

        let created = {
            let mut repo = StudentRepository::new(FileBackend::new(dir.path().to_path_buf()).unwrap());
            repo.set_user(Some(user.clone())).unwrap();
            let teacher = repo.add_teacher("Ms. Park").unwrap().unwrap();
            let mut new = new_student("Liam Chen");
            new.teacher_assigned = Some(teacher.id);
            repo.add_student(new).unwrap().unwrap()
        };

        let mut reopened = StudentRepository::new(FileBackend::new(dir.path().to_path_buf()).unwrap());
        reopened.set_user(Some(user)).unwrap();

        assert_eq!(reopened.students().len(), 7);
        assert_eq!(reopened.get_student_by_id(&created.id), Some(&created));
        assert_eq!(reopened.teachers().len(), 1);
    }
}
