//! Alert fragments for displaying success and error messages to users.

use maud::{Markup, html};

/// Alert message types for styling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertKind {
    /// A confirmation that an action succeeded.
    Success,
    /// A message explaining why an action failed.
    Error,
}

/// Render an alert message with appropriate styling.
pub fn alert(kind: AlertKind, message: &str, details: &str) -> Markup {
    let (style, role) = match kind {
        AlertKind::Success => (
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
            dark:bg-gray-800 dark:text-green-400",
            "status",
        ),
        AlertKind::Error => (
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
            dark:bg-gray-800 dark:text-red-400",
            "alert",
        ),
    };

    html!(
        div class=(style) role=(role)
        {
            span class="font-medium" { (message) }

            @if !details.is_empty() {
                " " (details)
            }
        }
    )
}
