//! Application state management for Caseload.
//!
//! This module contains the `App` struct that owns the repository for the
//! signed-in user together with all UI state: the active tab, dashboard
//! filter, selections, input forms and confirmation dialogs.

use anyhow::Result;
use tracing::{debug, info, warn};

use caseload_core::{
    Config, DisabilityLevel, FileBackend, NewStudent, StorageBackend, StoreResult, Student,
    StudentFilter, StudentId, StudentRepository, Teacher, TeacherId, UserId,
};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for the user id typed at the sign-in prompt.
const MAX_USER_ID_LENGTH: usize = 64;

/// Maximum length for names and other free-text form fields.
const MAX_TEXT_LENGTH: usize = 80;

/// Maximum length for the dashboard search text.
const MAX_SEARCH_LENGTH: usize = 40;

/// Maximum accepted student age.
const MAX_AGE: u32 = 30;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

pub type Repository = StudentRepository<Box<dyn StorageBackend>>;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Students,
    Teachers,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Students => "Students",
            Tab::Teachers => "Teachers",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Students => Tab::Teachers,
            Tab::Teachers => Tab::Students,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        self.next()
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    SigningIn,
    AddingStudent,
    AddingTeacher,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Record waiting for delete confirmation, with its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDelete {
    Student(StudentId, String),
    Teacher(TeacherId, String),
}

impl PendingDelete {
    pub fn prompt(&self) -> String {
        match self {
            PendingDelete::Student(_, name) => format!("Delete student {}?", name),
            PendingDelete::Teacher(_, name) => format!("Delete teacher {}?", name),
        }
    }
}

// ============================================================================
// Add Student Form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Age,
    Grade,
    DisabilityType,
    Level,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Name,
        FormField::Age,
        FormField::Grade,
        FormField::DisabilityType,
        FormField::Level,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Age => "Age",
            FormField::Grade => "Grade",
            FormField::DisabilityType => "Disability",
            FormField::Level => "Level",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            FormField::Name => FormField::Age,
            FormField::Age => FormField::Grade,
            FormField::Grade => FormField::DisabilityType,
            FormField::DisabilityType => FormField::Level,
            FormField::Level => FormField::Name,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Name => FormField::Level,
            FormField::Age => FormField::Name,
            FormField::Grade => FormField::Age,
            FormField::DisabilityType => FormField::Grade,
            FormField::Level => FormField::DisabilityType,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentForm {
    pub name: String,
    pub age: String,
    pub grade: String,
    pub disability_type: String,
    pub level: DisabilityLevel,
    pub focus: FormField,
    pub error: Option<String>,
}

impl Default for StudentForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            age: String::new(),
            grade: String::new(),
            disability_type: String::new(),
            level: DisabilityLevel::Mild,
            focus: FormField::Name,
            error: None,
        }
    }
}

impl StudentForm {
    /// Display value of a field.
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Age => &self.age,
            FormField::Grade => &self.grade,
            FormField::DisabilityType => &self.disability_type,
            FormField::Level => self.level.as_str(),
        }
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            FormField::Age => {
                if c.is_ascii_digit() && self.age.len() < 3 {
                    self.age.push(c);
                }
            }
            FormField::Level => {
                if c == ' ' {
                    self.level = self.level.next();
                }
            }
            FormField::Name => push_text(&mut self.name, c),
            FormField::Grade => push_text(&mut self.grade, c),
            FormField::DisabilityType => push_text(&mut self.disability_type, c),
        }
    }

    pub fn pop_char(&mut self) {
        match self.focus {
            FormField::Name => {
                self.name.pop();
            }
            FormField::Age => {
                self.age.pop();
            }
            FormField::Grade => {
                self.grade.pop();
            }
            FormField::DisabilityType => {
                self.disability_type.pop();
            }
            FormField::Level => {}
        }
    }

    /// Validate the form into a new student record.
    pub fn to_new_student(&self) -> std::result::Result<NewStudent, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        let age: u32 = self
            .age
            .trim()
            .parse()
            .map_err(|_| "Age must be a number".to_string())?;
        if age == 0 || age > MAX_AGE {
            return Err(format!("Age must be between 1 and {}", MAX_AGE));
        }
        let grade = self.grade.trim();
        if grade.is_empty() {
            return Err("Grade is required".to_string());
        }
        let disability_type = self.disability_type.trim();
        if disability_type.is_empty() {
            return Err("Disability type is required".to_string());
        }

        Ok(NewStudent::new(name, age, grade, disability_type, self.level))
    }
}

fn push_text(field: &mut String, c: char) {
    if can_add_char(field.chars().count(), c, MAX_TEXT_LENGTH) {
        field.push(c);
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub repo: Repository,
    persist_config: bool,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub filter: StudentFilter,

    // Selection indices (into the filtered student list / teacher list)
    pub student_selection: usize,
    pub teacher_selection: usize,

    // Input state
    pub user_input: String,
    pub teacher_input: String,
    pub student_form: StudentForm,
    pub pending_delete: Option<PendingDelete>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create the application backed by files under the configured data directory.
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        debug!(?data_dir, "Data directory configured");
        let backend = FileBackend::new(data_dir)?;

        let mut app = Self::with_backend(config, Box::new(backend));
        app.persist_config = true;
        Ok(app)
    }

    /// Create the application over any storage backend. Config changes are not saved.
    pub fn with_backend(config: Config, backend: Box<dyn StorageBackend>) -> Self {
        let repo = StudentRepository::new(backend).with_sample_data(config.seed_sample_data);

        Self {
            config,
            repo,
            persist_config: false,

            state: AppState::Normal,
            current_tab: Tab::Students,
            filter: StudentFilter::default(),

            student_selection: 0,
            teacher_selection: 0,

            user_input: String::new(),
            teacher_input: String::new(),
            student_form: StudentForm::default(),
            pending_delete: None,

            status_message: None,
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn current_user(&self) -> Option<&UserId> {
        self.repo.current_user()
    }

    pub fn is_signed_in(&self) -> bool {
        self.repo.current_user().is_some()
    }

    /// Switch to `user`, loading their records.
    pub fn sign_in(&mut self, user: UserId) {
        info!(user = %user, "Signing in");
        let result = self.repo.set_user(Some(user.clone()));
        if self.report(result).is_none() {
            return;
        }

        self.student_selection = 0;
        self.teacher_selection = 0;
        self.status_message = Some(format!("Signed in as {}", user));

        self.config.last_user_id = Some(user.to_string());
        if self.persist_config {
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    pub fn start_sign_in(&mut self) {
        self.user_input = self
            .current_user()
            .map(|u| u.to_string())
            .unwrap_or_default();
        self.state = AppState::SigningIn;
    }

    pub fn submit_sign_in(&mut self) {
        let user = self.user_input.trim().to_string();
        if user.is_empty() {
            self.status_message = Some("Enter a user id to continue".to_string());
            return;
        }
        self.sign_in(UserId::new(user));
        self.state = AppState::Normal;
    }

    // =========================================================================
    // Data Access Methods
    // =========================================================================

    /// Students passing the dashboard filter.
    pub fn visible_students(&self) -> Vec<&Student> {
        self.repo.filtered_students(&self.filter)
    }

    pub fn selected_student(&self) -> Option<&Student> {
        self.visible_students().get(self.student_selection).copied()
    }

    pub fn selected_teacher(&self) -> Option<&Teacher> {
        self.repo.teachers().get(self.teacher_selection)
    }

    /// Display name of a student's teacher.
    pub fn teacher_label(&self, student: &Student) -> String {
        match &student.teacher_assigned {
            Some(id) => self.repo.teacher_name(id).unwrap_or("Unknown").to_string(),
            None => "Unassigned".to_string(),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    fn current_len(&self) -> usize {
        match self.current_tab {
            Tab::Students => self.visible_students().len(),
            Tab::Teachers => self.repo.teachers().len(),
        }
    }

    fn selection_mut(&mut self) -> &mut usize {
        match self.current_tab {
            Tab::Students => &mut self.student_selection,
            Tab::Teachers => &mut self.teacher_selection,
        }
    }

    /// Move the selection of the current tab, clamped to the list.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_len();
        let selection = self.selection_mut();
        if len == 0 {
            *selection = 0;
            return;
        }
        let target = (*selection as isize + delta).clamp(0, len as isize - 1);
        *selection = target as usize;
    }

    pub fn select_first(&mut self) {
        *self.selection_mut() = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.current_len();
        *self.selection_mut() = len.saturating_sub(1);
    }

    fn clamp_selections(&mut self) {
        let students = self.visible_students().len();
        let teachers = self.repo.teachers().len();
        self.student_selection = self.student_selection.min(students.saturating_sub(1));
        self.teacher_selection = self.teacher_selection.min(teachers.saturating_sub(1));
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.clamp_selections();
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    pub fn cycle_level_filter(&mut self) {
        self.filter.level = self.filter.level.next();
        self.student_selection = 0;
    }

    pub fn push_search_char(&mut self, c: char) {
        if can_add_char(self.filter.search.chars().count(), c, MAX_SEARCH_LENGTH) {
            self.filter.search.push(c);
            self.student_selection = 0;
        }
    }

    pub fn pop_search_char(&mut self) {
        self.filter.search.pop();
        self.student_selection = 0;
    }

    pub fn clear_filter(&mut self) {
        self.filter = StudentFilter::default();
        self.student_selection = 0;
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Open the add form for the current tab.
    pub fn begin_add(&mut self) {
        if !self.is_signed_in() {
            self.start_sign_in();
            return;
        }
        match self.current_tab {
            Tab::Students => {
                self.student_form = StudentForm::default();
                self.state = AppState::AddingStudent;
            }
            Tab::Teachers => {
                self.teacher_input.clear();
                self.state = AppState::AddingTeacher;
            }
        }
    }

    pub fn push_teacher_char(&mut self, c: char) {
        push_text(&mut self.teacher_input, c);
    }

    pub fn submit_teacher(&mut self) {
        let name = self.teacher_input.trim().to_string();
        if name.is_empty() {
            self.status_message = Some("Teacher name is required".to_string());
            return;
        }

        let result = self.repo.add_teacher(name);
        if let Some(Some(teacher)) = self.report(result) {
            self.status_message = Some(format!("Added teacher {}", teacher.name));
            self.teacher_selection = self.repo.teachers().len().saturating_sub(1);
        }
        self.teacher_input.clear();
        self.state = AppState::Normal;
    }

    pub fn submit_student_form(&mut self) {
        let new_student = match self.student_form.to_new_student() {
            Ok(student) => student,
            Err(message) => {
                self.student_form.error = Some(message);
                return;
            }
        };

        let result = self.repo.add_student(new_student);
        if let Some(Some(student)) = self.report(result) {
            self.status_message = Some(format!("Added student {}", student.name));
            if let Some(index) = self.visible_students().iter().position(|s| s.id == student.id) {
                self.student_selection = index;
            }
        }
        self.state = AppState::Normal;
    }

    /// Assign the selected student to the next teacher, then back to unassigned.
    pub fn cycle_teacher_assignment(&mut self) {
        if self.selected_student().is_none() {
            return;
        }
        if self.repo.teachers().is_empty() {
            self.status_message = Some("Add a teacher first".to_string());
            return;
        }

        let Some((student_id, next)) = self.selected_student().map(|student| {
            let teachers = self.repo.teachers();
            let next = match &student.teacher_assigned {
                None => teachers.first(),
                Some(current) => match teachers.iter().position(|t| &t.id == current) {
                    Some(index) => teachers.get(index + 1),
                    None => teachers.first(),
                },
            };
            (student.id.clone(), next.map(|t| t.id.clone()))
        }) else {
            return;
        };

        let result = self.repo.assign_teacher(&student_id, next);
        if let Some(Some(updated)) = self.report(result) {
            let label = self.teacher_label(&updated);
            self.status_message = Some(format!("{}: {}", updated.name, label));
        }
    }

    /// Ask for confirmation before deleting the selected record.
    pub fn request_delete(&mut self) {
        let pending = match self.current_tab {
            Tab::Students => self
                .selected_student()
                .map(|s| PendingDelete::Student(s.id.clone(), s.name.clone())),
            Tab::Teachers => self
                .selected_teacher()
                .map(|t| PendingDelete::Teacher(t.id.clone(), t.name.clone())),
        };
        if let Some(pending) = pending {
            self.pending_delete = Some(pending);
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(pending) = self.pending_delete.take() else {
            return;
        };

        match pending {
            PendingDelete::Student(id, name) => {
                let result = self.repo.delete_student(&id);
                if let Some(true) = self.report(result) {
                    self.status_message = Some(format!("Deleted student {}", name));
                }
            }
            PendingDelete::Teacher(id, name) => {
                let unassigned = self.repo.students_assigned_to(&id).len();
                let result = self.repo.delete_teacher(&id);
                if let Some(true) = self.report(result) {
                    self.status_message = Some(format!(
                        "Deleted teacher {} ({} student(s) unassigned)",
                        name, unassigned
                    ));
                }
            }
        }
        self.clamp_selections();
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    /// Show a repository error in the status bar. Returns the value on success.
    fn report<T>(&mut self, result: StoreResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Repository operation failed");
                self.status_message = Some(format!("Error: {}", e));
                None
            }
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a character may be appended to a field of `current_len` chars.
pub fn can_add_char(current_len: usize, c: char, max_len: usize) -> bool {
    current_len < max_len && is_valid_input_char(c)
}

/// Check if a user id character should be accepted
pub fn can_add_user_id_char(current_len: usize, c: char) -> bool {
    can_add_char(current_len, c, MAX_USER_ID_LENGTH) && !c.is_whitespace()
}

// ============================================================================
// Tests
// ============================================================================
