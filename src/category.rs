//! Categories group transactions, e.g. "Groceries" or "Rent".
//!
//! Categories are global: they are shared by all users and are typically
//! seeded once, though they can also be created ad hoc from the web UI.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::CategoryId,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
    },
    navigation::NavBar,
};

/// The name of a category.
///
/// The inner string is guaranteed to be non-empty and non-blank.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from a string.
    ///
    /// # Errors
    /// Returns [Error::EmptyCategoryName] if `name` is empty or only
    /// whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.trim().is_empty() {
            return Err(Error::EmptyCategoryName);
        }

        Ok(Self(name.trim().to_owned()))
    }

    /// Create a category name without validation.
    ///
    /// Intended for values loaded from the database, which were validated
    /// when they were inserted.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// The category name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named grouping for transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category.
    pub name: CategoryName,
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE CHECK(name <> '')
                )",
        (),
    )?;

    Ok(())
}

/// Create a new category in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCategoryName] if a category named `name` already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(name: CategoryName, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("INSERT INTO category (name) VALUES (?1) RETURNING id, name")?
        .query_row([name.as_str()], map_category_row)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateCategoryName(name.to_string()),
            error => error.into(),
        })
}

/// Get all categories ordered by their ID.
///
/// The ID ordering gives charts and select menus a stable order across calls.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name FROM category ORDER BY id ASC")?
        .query_map([], map_category_row)?
        .map(|category_result| category_result.map_err(|error| error.into()))
        .collect()
}

fn map_category_row(row: &rusqlite::Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;

    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);

    Ok(Category { id, name })
}

/// The state needed to create a category.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    /// The name of the new category.
    pub name: Option<String>,
}

/// Display the page for creating a new category.
pub async fn get_new_category_page() -> Markup {
    let content = html! {
        (NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "New category" }

            form
                hx-post=(endpoints::CATEGORIES_API)
                hx-target="this"
                hx-swap="outerHTML"
                class="w-full max-w-md space-y-4"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }
                    input
                        name="name"
                        id="name"
                        type="text"
                        placeholder="e.g. Groceries"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create category" }
            }
        }
    };

    base("New category", &[], &content)
}

/// A route handler for creating a new category.
///
/// On success the client is redirected to the new transaction page where the
/// category can be used right away.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let name = match CategoryName::new(form.name.as_deref().unwrap_or_default()) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLock.into_alert_response();
        }
    };

    if let Err(error) = create_category(name, &connection) {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::NEW_TRANSACTION_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{CategoryName, create_category, get_all_categories};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_and_list_categories_in_id_order() {
        let conn = get_test_connection();
        let names = ["Groceries", "Rent", "Salary"];

        for name in names {
            create_category(CategoryName::new_unchecked(name), &conn).unwrap();
        }

        let categories = get_all_categories(&conn).unwrap();

        assert_eq!(categories.len(), 3);
        for (category, want_name) in categories.iter().zip(names) {
            assert_eq!(category.name.as_str(), want_name);
        }
        assert!(
            categories.windows(2).all(|pair| pair[0].id < pair[1].id),
            "expected categories ordered by ID"
        );
    }

    #[test]
    fn create_fails_on_duplicate_name() {
        let conn = get_test_connection();
        create_category(CategoryName::new_unchecked("Groceries"), &conn).unwrap();

        let result = create_category(CategoryName::new_unchecked("Groceries"), &conn);

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Groceries".to_owned()))
        );
    }
}
