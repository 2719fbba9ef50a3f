//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{can_add_user_id_char, App, AppState, FormField, Tab, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::SigningIn => return handle_sign_in_input(app, key),
        AppState::AddingStudent => return handle_student_form_input(app, key),
        AppState::AddingTeacher => return handle_teacher_input(app, key),
        AppState::Searching => return handle_search_input(app, key),
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Any key press clears the last status message
    app.status_message = None;

    // Global keys
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('1') => app.switch_tab(Tab::Students),
        KeyCode::Char('2') => app.switch_tab(Tab::Teachers),
        KeyCode::Left => app.switch_tab(app.current_tab.prev()),
        KeyCode::Right => app.switch_tab(app.current_tab.next()),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        KeyCode::Char('s') => app.start_sign_in(),
        KeyCode::Char('a') => app.begin_add(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('/') if app.current_tab == Tab::Students => {
            app.state = AppState::Searching;
        }
        KeyCode::Char('l') if app.current_tab == Tab::Students => app.cycle_level_filter(),
        KeyCode::Char('t') if app.current_tab == Tab::Students => app.cycle_teacher_assignment(),
        KeyCode::Esc if app.current_tab == Tab::Students => app.clear_filter(),
        _ => {}
    }

    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.clear_filter();
            app.state = AppState::Normal;
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Up => app.move_selection(-1),
        KeyCode::Down => app.move_selection(1),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
    Ok(false)
}

fn handle_sign_in_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Nothing to go back to without a session
            if app.is_signed_in() {
                app.user_input.clear();
                app.state = AppState::Normal;
            } else {
                app.state = AppState::ConfirmingQuit;
            }
        }
        KeyCode::Enter => app.submit_sign_in(),
        KeyCode::Backspace => {
            app.user_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_user_id_char(app.user_input.chars().count(), c) {
                app.user_input.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_teacher_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.teacher_input.clear();
            app.state = AppState::Normal;
        }
        KeyCode::Enter => app.submit_teacher(),
        KeyCode::Backspace => {
            app.teacher_input.pop();
        }
        KeyCode::Char(c) => app.push_teacher_char(c),
        _ => {}
    }
    Ok(false)
}

fn handle_student_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            return Ok(false);
        }
        KeyCode::Enter => {
            app.submit_student_form();
            return Ok(false);
        }
        _ => {}
    }

    let form = &mut app.student_form;
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
        KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
        KeyCode::Right if form.focus == FormField::Level => form.level = form.level.next(),
        KeyCode::Left if form.focus == FormField::Level => form.level = form.level.prev(),
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => return Ok(false),
    }
    form.error = None;
    Ok(false)
}
