//! Console session: role selection, the admin and patron menus, and the
//! Y/N confirmations that guard every mutating call.

use crate::app::screen::Screen;
use crate::config::LibraryConfig;
use crate::core::library::LibraryService;
use crate::core::Storage;
use crate::utils::error::{LibraryError, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub admin_username: String,
    pub admin_password: String,
    pub library_name: String,
    pub clear_screen: bool,
    pub pause_after_action: bool,
}

impl From<&LibraryConfig> for SessionOptions {
    fn from(config: &LibraryConfig) -> Self {
        Self {
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
            library_name: config.library_name.clone(),
            clear_screen: config.clear_screen,
            pause_after_action: config.pause_after_action,
        }
    }
}

/// Where control goes after a menu returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Stay,
    LogOut,
    /// Input is exhausted.
    Quit,
}

pub struct Session<'a, S: Storage, R, W> {
    library: &'a mut LibraryService<S>,
    input: Lines<R>,
    out: W,
    screen: Screen,
    options: SessionOptions,
}

impl<'a, S, R, W> Session<'a, S, R, W>
where
    S: Storage,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(library: &'a mut LibraryService<S>, input: R, out: W, options: SessionOptions) -> Self {
        let screen = Screen::new(options.library_name.clone(), options.clear_screen);
        Self {
            library,
            input: input.lines(),
            out,
            screen,
            options,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs until the user picks Exit or input ends, then flushes the catalog
    /// one last time.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.screen.clear(&mut self.out)?;
            self.screen.banner(&mut self.out)?;
            write!(self.out, "Log in as:\n1. Admin\n2. User\n0. Exit\n")?;
            let Some(choice) = self.prompt("\nEnter choice: ").await? else {
                break;
            };

            let flow = match choice.as_str() {
                "1" => self.admin_login().await?,
                "2" => self.user_login().await?,
                "0" => break,
                _ => Flow::Stay,
            };
            if flow == Flow::Quit {
                break;
            }
        }

        if let Err(e) = self.library.flush().await {
            tracing::error!("❌ Final flush failed: {}", e);
            writeln!(self.out, "{}", e.user_friendly_message())?;
        }
        writeln!(self.out, "Thank you for using the {}!", self.screen.title())?;
        self.out.flush()?;
        tracing::info!("👋 Session ended");
        Ok(())
    }

    // ---- input helpers ----

    async fn read_line(&mut self) -> Result<Option<String>> {
        let line = self.input.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    async fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;
        self.read_line().await
    }

    async fn confirm(&mut self, question: &str) -> Result<Option<bool>> {
        let answer = self.prompt(&format!("\nAre you sure you want to {}? (Y/N): ", question)).await?;
        Ok(answer.map(|a| a.starts_with(['Y', 'y'])))
    }

    async fn pause(&mut self) -> Result<Flow> {
        if !self.options.pause_after_action {
            return Ok(Flow::Stay);
        }
        match self.prompt("\nPlease enter to continue...").await? {
            Some(_) => Ok(Flow::Stay),
            None => Ok(Flow::Quit),
        }
    }

    fn report(&mut self, err: &LibraryError) -> Result<()> {
        tracing::warn!(category = ?err.category(), "{}", err);
        writeln!(self.out, "{}", err.user_friendly_message())?;
        Ok(())
    }

    // ---- login ----

    async fn admin_login(&mut self) -> Result<Flow> {
        write!(self.out, "\nAdmin:\n")?;
        let Some(username) = self.prompt("Enter username: ").await? else {
            return Ok(Flow::Quit);
        };
        let Some(password) = self.prompt("Enter password: ").await? else {
            return Ok(Flow::Quit);
        };

        if username == self.options.admin_username && password == self.options.admin_password {
            tracing::info!("🔑 Admin logged in");
            return self.admin_menu().await;
        }
        tracing::warn!("Rejected admin login for '{}'", username);
        writeln!(self.out, "Invalid username or password.")?;
        self.pause().await
    }

    async fn user_login(&mut self) -> Result<Flow> {
        write!(self.out, "\nUser:\n")?;
        let Some(id) = self.prompt("Enter User ID: ").await? else {
            return Ok(Flow::Quit);
        };

        if self.library.catalog().user_exists(&id) {
            tracing::info!(user = %id, "🔑 User logged in");
            return self.user_menu(&id).await;
        }
        writeln!(
            self.out,
            "User ID not found. Please contact {} to register.",
            self.screen.library_name()
        )?;
        self.pause().await
    }

    // ---- admin ----

    async fn admin_menu(&mut self) -> Result<Flow> {
        loop {
            self.screen.clear(&mut self.out)?;
            self.screen.banner(&mut self.out)?;
            write!(
                self.out,
                "=== Admin Menu ===\n1. Books\n2. Users\n3. Add Book\n4. Remove Book\n\
                 5. Edit User\n6. Remove User\n7. Register User\n8. Log Out\n"
            )?;
            let Some(choice) = self.prompt("\nEnter choice: ").await? else {
                return Ok(Flow::Quit);
            };

            let flow = match choice.as_str() {
                "1" => {
                    self.show_books()?;
                    Flow::Stay
                }
                "2" => {
                    self.show_users()?;
                    Flow::Stay
                }
                "3" => self.add_book().await?,
                "4" => self.remove_book().await?,
                "5" => self.edit_user().await?,
                "6" => self.remove_user().await?,
                "7" => self.register_user().await?,
                "8" => match self.confirm("log out").await? {
                    Some(true) => return Ok(Flow::LogOut),
                    Some(false) => continue,
                    None => return Ok(Flow::Quit),
                },
                _ => continue,
            };
            if flow == Flow::Quit || self.pause().await? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
    }

    async fn add_book(&mut self) -> Result<Flow> {
        self.show_books()?;
        write!(self.out, "\n--- Add New Book ---\n")?;
        let Some(title) = self.prompt("Title: ").await? else {
            return Ok(Flow::Quit);
        };
        let Some(author) = self.prompt("Author: ").await? else {
            return Ok(Flow::Quit);
        };
        let Some(isbn) = self.prompt("ISBN: ").await? else {
            return Ok(Flow::Quit);
        };

        match self.confirm("add this book").await? {
            None => return Ok(Flow::Quit),
            Some(false) => writeln!(self.out, "Cancelled: Book not added.")?,
            Some(true) => match self.library.add_book(&title, &author, &isbn).await {
                Ok(book) => writeln!(self.out, "Successfully added: {}", book)?,
                Err(e) => self.report(&e)?,
            },
        }
        Ok(Flow::Stay)
    }

    async fn remove_book(&mut self) -> Result<Flow> {
        self.show_books()?;
        if self.library.catalog().book_count() == 0 {
            return Ok(Flow::Stay);
        }
        let Some(selection) = self.prompt("\nEnter book number to remove: ").await? else {
            return Ok(Flow::Quit);
        };
        let selector = parse_selector(&selection);

        let book = match self.library.catalog().book_at(selector).cloned() {
            Ok(book) => book,
            Err(e) => {
                self.report(&e)?;
                return Ok(Flow::Stay);
            }
        };

        let question = format!("remove \"{}\" by {} ({})", book.title, book.author, book.isbn);
        match self.confirm(&question).await? {
            None => return Ok(Flow::Quit),
            Some(false) => writeln!(self.out, "Cancelled: Book not removed.")?,
            Some(true) => match self.library.remove_book(selector).await {
                Ok(removed) => writeln!(self.out, "Successfully removed: {}", removed)?,
                Err(e) => self.report(&e)?,
            },
        }
        Ok(Flow::Stay)
    }

    async fn edit_user(&mut self) -> Result<Flow> {
        self.show_users_numbered()?;
        if self.library.catalog().user_count() == 0 {
            return Ok(Flow::Stay);
        }
        let Some(selection) = self.prompt("\nEnter user number to edit: ").await? else {
            return Ok(Flow::Quit);
        };
        let selector = parse_selector(&selection);
        if let Err(e) = self.library.catalog().user_at(selector).map(|_| ()) {
            self.report(&e)?;
            return Ok(Flow::Stay);
        }

        let Some(new_name) = self.prompt("\nEnter new name: ").await? else {
            return Ok(Flow::Quit);
        };
        match self.confirm("update the name").await? {
            None => return Ok(Flow::Quit),
            Some(false) => writeln!(self.out, "Cancelled: User not updated.")?,
            Some(true) => match self.library.edit_user_name(selector, &new_name).await {
                Ok(user) => writeln!(self.out, "Successfully updated user: {}", user)?,
                Err(e) => self.report(&e)?,
            },
        }
        Ok(Flow::Stay)
    }

    async fn remove_user(&mut self) -> Result<Flow> {
        self.show_users_numbered()?;
        if self.library.catalog().user_count() == 0 {
            return Ok(Flow::Stay);
        }
        let Some(selection) = self.prompt("\nEnter user number to remove: ").await? else {
            return Ok(Flow::Quit);
        };
        let selector = parse_selector(&selection);

        let user = match self.library.catalog().user_at(selector).cloned() {
            Ok(user) => user,
            Err(e) => {
                self.report(&e)?;
                return Ok(Flow::Stay);
            }
        };

        match self.confirm(&format!("remove {}", user)).await? {
            None => return Ok(Flow::Quit),
            Some(false) => writeln!(self.out, "Cancelled: User not removed.")?,
            Some(true) => match self.library.remove_user(selector).await {
                Ok(removed) => writeln!(self.out, "Successfully removed user: {}", removed)?,
                Err(e) => self.report(&e)?,
            },
        }
        Ok(Flow::Stay)
    }

    async fn register_user(&mut self) -> Result<Flow> {
        write!(self.out, "\n--- Register New User ---\n")?;
        let Some(id) = self.prompt("Enter User ID: ").await? else {
            return Ok(Flow::Quit);
        };
        let Some(name) = self.prompt("Enter Name: ").await? else {
            return Ok(Flow::Quit);
        };

        match self.confirm("register this user").await? {
            None => return Ok(Flow::Quit),
            Some(false) => writeln!(self.out, "Cancelled: User not registered.")?,
            Some(true) => match self.library.register_user(&id, &name).await {
                Ok(user) => writeln!(self.out, "Successfully registered: {} ({})", user.name, user.id)?,
                Err(e) => self.report(&e)?,
            },
        }
        Ok(Flow::Stay)
    }

    // ---- patron ----

    async fn user_menu(&mut self, user_id: &str) -> Result<Flow> {
        loop {
            // 使用者可能已被移除
            let Some(user) = self.library.catalog().find_user(user_id) else {
                return Ok(Flow::LogOut);
            };
            let welcome = format!("Welcome, {} ({})", user.name, user.id);

            self.screen.clear(&mut self.out)?;
            self.screen.banner(&mut self.out)?;
            write!(
                self.out,
                "{}\n\n=== User Menu ===\n1. Books\n2. Borrow Book\n3. Return Book\n\
                 4. Borrowed Books\n5. Log Out\n",
                welcome
            )?;
            let Some(choice) = self.prompt("\nEnter choice: ").await? else {
                return Ok(Flow::Quit);
            };

            let flow = match choice.as_str() {
                "1" => {
                    self.show_books()?;
                    Flow::Stay
                }
                "2" => self.borrow_book(user_id).await?,
                "3" => self.return_book(user_id).await?,
                "4" => {
                    self.show_borrowed(user_id)?;
                    Flow::Stay
                }
                "5" => match self.confirm("log out").await? {
                    Some(true) => return Ok(Flow::LogOut),
                    Some(false) => continue,
                    None => return Ok(Flow::Quit),
                },
                _ => continue,
            };
            if flow == Flow::Quit || self.pause().await? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
    }

    async fn borrow_book(&mut self, user_id: &str) -> Result<Flow> {
        self.show_books()?;
        if self.library.catalog().book_count() == 0 {
            return Ok(Flow::Stay);
        }
        let Some(selection) = self.prompt("\nEnter book number to borrow: ").await? else {
            return Ok(Flow::Quit);
        };
        let selector = parse_selector(&selection);

        match self.confirm("borrow this book").await? {
            None => return Ok(Flow::Quit),
            Some(false) => writeln!(self.out, "Cancelled: Book not borrowed.")?,
            Some(true) => match self.library.borrow_book(selector, user_id).await {
                Ok(book) => writeln!(self.out, "Successfully borrowed: {}", book)?,
                Err(e) => self.report(&e)?,
            },
        }
        Ok(Flow::Stay)
    }

    async fn return_book(&mut self, user_id: &str) -> Result<Flow> {
        self.show_borrowed(user_id)?;
        let held = self
            .library
            .catalog()
            .find_user(user_id)
            .map_or(0, |user| user.borrowed_isbns.len());
        if held == 0 {
            return Ok(Flow::Stay);
        }
        let Some(selection) = self.prompt("\nEnter borrowed book number to return: ").await? else {
            return Ok(Flow::Quit);
        };
        let selector = parse_selector(&selection);

        match self.confirm("return this book").await? {
            None => return Ok(Flow::Quit),
            Some(false) => writeln!(self.out, "Cancelled: Book not returned.")?,
            Some(true) => match self.library.return_book(selector, user_id).await {
                Ok(book) => writeln!(self.out, "Successfully returned: {}", book)?,
                Err(e) => self.report(&e)?,
            },
        }
        Ok(Flow::Stay)
    }

    // ---- listings ----

    fn show_books(&mut self) -> Result<()> {
        writeln!(self.out, "\n--- Books in {} Library ---", self.screen.library_name())?;
        let listings = self.library.catalog().list_books();
        if listings.is_empty() {
            writeln!(self.out, "No books available.")?;
        }
        for listing in listings {
            writeln!(self.out, "{}", listing)?;
        }
        Ok(())
    }

    fn show_users(&mut self) -> Result<()> {
        writeln!(self.out, "\n--- Registered Users ---")?;
        let listings = self.library.catalog().list_users();
        if listings.is_empty() {
            writeln!(self.out, "No users registered.")?;
        }
        for listing in listings {
            writeln!(self.out, "{}", listing)?;
        }
        Ok(())
    }

    fn show_users_numbered(&mut self) -> Result<()> {
        writeln!(self.out, "\n--- Registered Users ---")?;
        let listings = self.library.catalog().list_users();
        if listings.is_empty() {
            writeln!(self.out, "No users registered.")?;
        }
        for listing in listings {
            writeln!(self.out, "{}. {}: {}", listing.position, listing.id, listing.name)?;
        }
        Ok(())
    }

    fn show_borrowed(&mut self, user_id: &str) -> Result<()> {
        let Some(user) = self.library.catalog().find_user(user_id) else {
            writeln!(self.out, "User not found.")?;
            return Ok(());
        };
        let (name, held) = (user.name.clone(), user.borrowed_isbns.len());

        writeln!(self.out, "\n--- Borrowed Books for {} ---", name)?;
        if held == 0 {
            writeln!(self.out, "No book's borrowed.")?;
            return Ok(());
        }
        for listing in self.library.catalog().list_borrowed(user_id)? {
            writeln!(self.out, "{}", listing)?;
        }
        Ok(())
    }
}

/// Anything that is not a positive number becomes 0, which no list accepts.
fn parse_selector(input: &str) -> usize {
    input.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::core::persistence::PersistenceGateway;

    fn options() -> SessionOptions {
        SessionOptions {
            pause_after_action: false,
            clear_screen: false,
            ..SessionOptions::from(&LibraryConfig::default())
        }
    }

    async fn run_script(storage: &MemoryStorage, script: &str) -> String {
        let gateway = PersistenceGateway::new(storage.clone(), "books.txt", "users.txt");
        let mut library = LibraryService::open(gateway, false, true).await.unwrap();
        let mut session = Session::new(&mut library, script.as_bytes(), Vec::new(), options());
        session.run().await.unwrap();
        String::from_utf8(session.into_output()).unwrap()
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(parse_selector(" 3 "), 3);
        assert_eq!(parse_selector("-1"), 0);
        assert_eq!(parse_selector("abc"), 0);
    }

    #[tokio::test]
    async fn test_exit_flushes_and_says_goodbye() {
        let storage = MemoryStorage::new();
        let output = run_script(&storage, "0\n").await;

        assert!(output.contains("HayMe Awdi Library Management System"));
        assert!(output.ends_with("Thank you for using the HayMe Awdi Library Management System!\n"));
        assert!(storage.get_text("books.txt").await.is_some());
        assert!(storage.get_text("users.txt").await.is_some());
    }

    #[tokio::test]
    async fn test_end_of_input_acts_as_exit() {
        let storage = MemoryStorage::new();
        let output = run_script(&storage, "1\nAdmin\n").await;
        assert!(output.contains("Thank you for using"));
    }

    #[tokio::test]
    async fn test_wrong_admin_password() {
        let storage = MemoryStorage::new();
        let output = run_script(&storage, "1\nAdmin\n12345\n0\n").await;
        assert!(output.contains("Invalid username or password."));
        assert!(!output.contains("=== Admin Menu ==="));
    }

    #[tokio::test]
    async fn test_admin_registers_user_and_adds_book() {
        let storage = MemoryStorage::new();
        let script = "1\nAdmin\n00000\n\
                      7\nU1\nAlice\ny\n\
                      3\nDune\nHerbert\n77\nY\n\
                      2\n\
                      8\ny\n0\n";
        let output = run_script(&storage, script).await;

        assert!(output.contains("Successfully registered: Alice (U1)"));
        assert!(output.contains("Successfully added: Dune by Herbert (77)"));
        assert!(output.contains("U1: Alice | Borrowed: No book's borrowed"));
        assert_eq!(storage.get_text("users.txt").await.unwrap(), "U1|Alice\n");
        assert!(storage.get_text("books.txt").await.unwrap().ends_with("Dune|Herbert|77|1|\n"));
    }

    #[tokio::test]
    async fn test_declined_confirmation_changes_nothing() {
        let storage = MemoryStorage::new();
        let script = "1\nAdmin\n00000\n4\n1\nn\n8\ny\n0\n";
        let output = run_script(&storage, script).await;

        assert!(output.contains("Are you sure you want to remove \"Venom\" by Ruben Samuel Fleischer (01)? (Y/N): "));
        assert!(output.contains("Cancelled: Book not removed."));
        assert!(storage.get_text("books.txt").await.unwrap().starts_with("Venom|"));
    }

    #[tokio::test]
    async fn test_patron_borrows_and_returns() {
        let storage = MemoryStorage::new();
        storage.put("users.txt", "U1|Alice\n").await;
        let script = "2\nU1\n\
                      2\n3\ny\n\
                      1\n\
                      3\n1\ny\n\
                      4\n\
                      5\ny\n0\n";
        let output = run_script(&storage, script).await;

        assert!(output.contains("Welcome, Alice (U1)"));
        assert!(output.contains("Successfully borrowed: The Wild Robot by Christopher Michael Sanders (03)"));
        assert!(output.contains("3. The Wild Robot by Christopher Michael Sanders (03) - Borrowed by: Alice (U1)"));
        assert!(output.contains("Successfully returned: The Wild Robot by Christopher Michael Sanders (03)"));
        assert!(output.contains("No book's borrowed."));
        assert_eq!(storage.get_text("users.txt").await.unwrap(), "U1|Alice\n");
    }

    #[tokio::test]
    async fn test_unknown_patron_id() {
        let storage = MemoryStorage::new();
        let output = run_script(&storage, "2\nnobody\n0\n").await;
        assert!(output.contains("User ID not found. Please contact HayMe Awdi to register."));
    }

    #[tokio::test]
    async fn test_invalid_selection_is_reported() {
        let storage = MemoryStorage::new();
        storage.put("users.txt", "U1|Alice\n").await;
        let output = run_script(&storage, "2\nU1\n2\n9\ny\n5\ny\n0\n").await;
        assert!(output.contains("Failed: Invalid selection."));
    }
}
