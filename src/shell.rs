// Interactive menu over a TaskStore

use crate::error::StoreError;
use crate::store::TaskStore;
use crate::task::Task;
use chrono::{Days, NaiveDate};
use eyre::{Context, Result};
use std::io::{BufRead, Write};
use tracing::{debug, info};

/// Date format accepted for deadlines
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MENU: &str = "\
1) Today's tasks
2) Week's tasks
3) All tasks
4) Missed tasks
5) Add task
6) Delete task
0) Exit";

/// Parse a user-entered deadline
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .wrap_err_with(|| format!("Invalid date '{}', expected YYYY-MM-DD", input.trim()))
}

/// Reads menu choices from `input`, renders results to `output`.
///
/// `today` is fixed when the shell is built and used for every view in the session.
pub struct Shell<'a, R, W> {
    store: &'a mut TaskStore,
    today: NaiveDate,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(store: &'a mut TaskStore, today: NaiveDate, input: R, output: W) -> Self {
        Self {
            store,
            today,
            input,
            output,
        }
    }

    /// Run the menu loop until the user exits or input ends
    pub fn run(&mut self) -> Result<()> {
        info!(db = ?self.store.path(), today = %self.today, "Starting menu");

        loop {
            writeln!(self.output, "{}", MENU)?;
            let Some(line) = self.read_line()? else {
                writeln!(self.output, "Bye")?;
                return Ok(());
            };

            debug!(choice = %line, "Menu choice");
            match line.parse::<u8>() {
                Ok(1) => self.today_tasks()?,
                Ok(2) => self.week_tasks()?,
                Ok(3) => self.all_tasks()?,
                Ok(4) => self.missed_tasks()?,
                Ok(5) => self.add_task()?,
                Ok(6) => self.delete_task()?,
                Ok(0) => {
                    writeln!(self.output, "Bye")?;
                    return Ok(());
                }
                _ => writeln!(self.output, "Invalid option")?,
            }
        }
    }

    pub fn today_tasks(&mut self) -> Result<()> {
        let tasks = self.store.get_by_exact_date(self.today)?;
        self.print_day(&format!("Today {}", self.today.format("%-d %b")), &tasks)
    }

    pub fn week_tasks(&mut self) -> Result<()> {
        for offset in 0..7 {
            // Stops early when the week runs past the last representable date
            let Some(day) = self.today.checked_add_days(Days::new(offset)) else {
                break;
            };
            let tasks = self.store.get_by_exact_date(day)?;
            self.print_day(&day.format("%A %-d %b").to_string(), &tasks)?;
        }
        Ok(())
    }

    pub fn all_tasks(&mut self) -> Result<()> {
        let tasks = self.store.get_all_ordered_by_deadline()?;
        writeln!(self.output, "All tasks")?;
        self.print_dated(&tasks, "Nothing to do!")
    }

    pub fn missed_tasks(&mut self) -> Result<()> {
        let tasks = self.store.get_overdue(self.today)?;
        writeln!(self.output, "Missed tasks")?;
        self.print_dated(&tasks, "Nothing is missed!")
    }

    pub fn add_task(&mut self) -> Result<()> {
        writeln!(self.output, "Enter task")?;
        let description = self.read_line()?.unwrap_or_default();
        writeln!(self.output, "Enter deadline")?;
        let deadline_input = self.read_line()?.unwrap_or_default();

        let deadline = match parse_date(&deadline_input) {
            Ok(d) => d,
            Err(e) => {
                writeln!(self.output, "{}\n", e)?;
                return Ok(());
            }
        };

        self.add(&description, deadline)
    }

    /// Create a task and report the outcome to the user
    pub fn add(&mut self, description: &str, deadline: NaiveDate) -> Result<()> {
        match self.store.create(description, deadline) {
            Ok(task) => {
                info!(id = task.id, deadline = %task.deadline, "Task added");
                writeln!(self.output, "The task has been added!\n")?;
                Ok(())
            }
            Err(e) => self.report(e),
        }
    }

    pub fn delete_task(&mut self) -> Result<()> {
        let tasks = self.store.get_all_ordered_by_deadline()?;
        if tasks.is_empty() {
            writeln!(self.output, "Nothing to delete!\n")?;
            return Ok(());
        }

        writeln!(self.output, "Choose the number of the task you want to delete:")?;
        self.print_dated(&tasks, "")?;

        let choice = self.read_line()?.unwrap_or_default();
        match choice.parse::<usize>() {
            Ok(n) => self.delete_nth(&tasks, n),
            Err(_) => {
                writeln!(self.output, "Invalid task number\n")?;
                Ok(())
            }
        }
    }

    /// Delete the task shown at 1-based position `n` of a listing
    pub fn delete_nth(&mut self, listed: &[Task], n: usize) -> Result<()> {
        let Some(task) = n.checked_sub(1).and_then(|i| listed.get(i)) else {
            writeln!(self.output, "Invalid task number\n")?;
            return Ok(());
        };

        match self.store.delete_by_id(task.id) {
            Ok(()) => {
                info!(id = task.id, "Task deleted");
                writeln!(self.output, "The task has been deleted!\n")?;
                Ok(())
            }
            Err(e) => self.report(e),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line).context("Failed to read input")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// User errors are printed and the session continues; anything else aborts it.
    fn report(&mut self, err: StoreError) -> Result<()> {
        if err.is_user_error() {
            writeln!(self.output, "{}\n", err)?;
            return Ok(());
        }
        Err(err.into())
    }

    fn print_day(&mut self, header: &str, tasks: &[Task]) -> Result<()> {
        writeln!(self.output, "{}", header)?;
        if tasks.is_empty() {
            writeln!(self.output, "Nothing to do!\n")?;
            return Ok(());
        }
        for (i, task) in tasks.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, task.description)?;
        }
        writeln!(self.output)?;
        Ok(())
    }

    fn print_dated(&mut self, tasks: &[Task], empty_message: &str) -> Result<()> {
        if tasks.is_empty() {
            writeln!(self.output, "{}\n", empty_message)?;
            return Ok(());
        }
        for (i, task) in tasks.iter().enumerate() {
            writeln!(
                self.output,
                "{}. {}. {}",
                i + 1,
                task.description,
                task.deadline.format("%-d %b")
            )?;
        }
        writeln!(self.output)?;
        Ok(())
    }
}
