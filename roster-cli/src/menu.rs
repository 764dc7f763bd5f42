//! Interactive menu
//!
//! Six actions, each a short form of text prompts that ends in a success,
//! warning or error line. Errors from one action are printed and the menu
//! continues.

use anyhow::Result;
use colored::*;
use dialoguer::{Confirm, Input, Select};

use crate::cli::handlers;
use crate::cli::{AddArgs, OutputFormat};
use crate::roster::{self, Record, record};
use crate::store::TabularStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    AddStudent,
    AddBatch,
    ViewStudents,
    SearchStudent,
    UpdateStudent,
    DeleteStudent,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 7] = [
        MenuAction::AddStudent,
        MenuAction::AddBatch,
        MenuAction::ViewStudents,
        MenuAction::SearchStudent,
        MenuAction::UpdateStudent,
        MenuAction::DeleteStudent,
        MenuAction::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuAction::AddStudent => "Add Student",
            MenuAction::AddBatch => "Add Batch",
            MenuAction::ViewStudents => "View Students",
            MenuAction::SearchStudent => "Search Student",
            MenuAction::UpdateStudent => "Update Student",
            MenuAction::DeleteStudent => "Delete Student",
            MenuAction::Quit => "Quit",
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    Ok(Input::<String>::new()
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()?)
}

fn prompt_with(label: &str, current: &str) -> Result<String> {
    Ok(Input::<String>::new()
        .with_prompt(label)
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()?)
}

pub async fn run_menu<S: TabularStore + ?Sized>(store: &S) -> Result<()> {
    println!("{}", "Student Management System".bold());

    let labels: Vec<&str> = MenuAction::ALL.iter().map(|a| a.label()).collect();
    loop {
        println!();
        let choice = Select::new()
            .with_prompt("Menu")
            .items(&labels[..])
            .default(0)
            .interact()?;
        let action = MenuAction::ALL[choice];
        if action == MenuAction::Quit {
            return Ok(());
        }

        println!("{}", action.label().cyan().bold());
        if let Err(e) = run_action(store, action).await {
            crate::cli::output::error(format!("{:#}", e));
        }
    }
}

async fn run_action<S: TabularStore + ?Sized>(store: &S, action: MenuAction) -> Result<()> {
    match action {
        MenuAction::AddStudent => {
            let args = AddArgs {
                name: prompt("Name")?,
                email: prompt("Email")?,
                grade: prompt("Grade")?,
                notes: prompt("Notes")?,
                id: None,
            };
            handlers::handle_add(store, args).await?;
        }
        MenuAction::AddBatch => {
            println!("Enter student data as Name,Email,Grade,Notes per line. Finish with an empty line.");
            let mut lines = Vec::new();
            loop {
                let line = prompt(">")?;
                if line.trim().is_empty() {
                    break;
                }
                lines.push(line);
            }
            if !lines.is_empty() {
                handlers::handle_add_batch_text(store, &lines.join("\n")).await?;
            }
        }
        MenuAction::ViewStudents => {
            handlers::handle_list(store, OutputFormat::Table).await?;
        }
        MenuAction::SearchStudent => {
            let id = prompt("Enter Student ID")?;
            handlers::handle_search(store, &id, OutputFormat::Json).await?;
        }
        MenuAction::UpdateStudent => {
            let id = prompt("Enter Student ID to Update")?;
            let found = roster::find_by_id(store, &id).await;
            if found.warning.is_some() {
                crate::cli::output::warning(handlers::FETCH_WARNING);
            }
            let Some(current) = found.value else {
                crate::cli::output::warning("Student not found");
                return Ok(());
            };

            let field = |name: &str| current.get(name).unwrap_or_default().to_string();
            let changes = Record::student(
                prompt_with("Name", &field(record::NAME))?,
                prompt_with("Email", &field(record::EMAIL))?,
                prompt_with("Grade", &field(record::GRADE))?,
                prompt_with("Notes", &field(record::NOTES))?,
            );
            handlers::handle_update_fields(store, &id, &changes).await?;
        }
        MenuAction::DeleteStudent => {
            let id = prompt("Enter Student ID to Delete")?;
            let confirmed = Confirm::new()
                .with_prompt(format!("Delete student {}?", id))
                .default(false)
                .interact()?;
            if confirmed {
                handlers::handle_delete(store, &id).await?;
            }
        }
        MenuAction::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_lists_six_actions_then_quit() {
        let labels: Vec<_> = MenuAction::ALL.iter().map(|a| a.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Add Student",
                "Add Batch",
                "View Students",
                "Search Student",
                "Update Student",
                "Delete Student",
                "Quit",
            ]
        );
    }
}
