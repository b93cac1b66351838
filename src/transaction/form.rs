//! The transaction form shared by the create and edit pages, and the
//! validation of its submissions.

use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    category::Category,
    database_id::{CategoryId, TransactionId},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
    },
};

use super::core::TransactionType;

/// The raw, untrusted form data of a create or edit transaction request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionFormData {
    /// Either `income` or `expense`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The amount of money in dollars.
    pub amount: Option<String>,
    /// When the transaction occurred, formatted as `YYYY-MM-DD`.
    pub date: Option<String>,
    /// The ID of the category the transaction belongs to.
    pub category: Option<String>,
}

/// Why a single form field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// The field was missing or empty.
    Missing,
    /// The amount could not be parsed as a number.
    NotANumber,
    /// The amount was zero or negative.
    NotPositive,
    /// The date was not a real date in `YYYY-MM-DD` format.
    InvalidDate,
    /// The type was neither `income` nor `expense`.
    UnknownType,
    /// The category does not exist.
    UnknownCategory,
}

impl FieldError {
    /// The message shown next to the rejected field.
    pub fn message(&self) -> &'static str {
        match self {
            FieldError::Missing => "This field is required.",
            FieldError::NotANumber => "Enter a number.",
            FieldError::NotPositive => "Amount must be greater than zero.",
            FieldError::InvalidDate => "Enter a valid date.",
            FieldError::UnknownType => "Select income or expense.",
            FieldError::UnknownCategory => "Select a valid category.",
        }
    }
}

/// The per-field validation errors of a rejected form submission.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ValidationErrors {
    /// The error for the type field, if any.
    pub kind: Option<FieldError>,
    /// The error for the amount field, if any.
    pub amount: Option<FieldError>,
    /// The error for the date field, if any.
    pub date: Option<FieldError>,
    /// The error for the category field, if any.
    pub category: Option<FieldError>,
}

impl ValidationErrors {
    /// Whether every field passed validation.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A form submission that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedTransaction {
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The amount of money in dollars, rounded to whole cents.
    pub amount: f64,
    /// When the transaction occurred.
    pub date: Date,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionType,
}

impl TransactionFormData {
    /// Validate the form data.
    ///
    /// Amounts are rounded to whole cents. Whether the category actually
    /// exists is left to the database insert, which reports it as an invalid
    /// category error.
    ///
    /// # Errors
    /// Returns the per-field errors if any field is missing or malformed.
    pub fn validate(&self) -> Result<ValidatedTransaction, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let kind = match self.kind.as_deref() {
            None | Some("") => {
                errors.kind = Some(FieldError::Missing);
                None
            }
            Some(kind) => match kind.parse::<TransactionType>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    errors.kind = Some(FieldError::UnknownType);
                    None
                }
            },
        };

        let amount = match self.amount.as_deref() {
            None | Some("") => {
                errors.amount = Some(FieldError::Missing);
                None
            }
            Some(amount) => match amount.parse::<f64>() {
                Ok(amount) if amount.is_finite() => {
                    let amount = (amount * 100.0).round() / 100.0;

                    if amount > 0.0 {
                        Some(amount)
                    } else {
                        errors.amount = Some(FieldError::NotPositive);
                        None
                    }
                }
                Ok(_) => {
                    errors.amount = Some(FieldError::NotANumber);
                    None
                }
                Err(_) => {
                    errors.amount = Some(FieldError::NotANumber);
                    None
                }
            },
        };

        let date_format = format_description!("[year]-[month]-[day]");
        let date = match self.date.as_deref() {
            None | Some("") => {
                errors.date = Some(FieldError::Missing);
                None
            }
            Some(date) => match Date::parse(date, &date_format) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.date = Some(FieldError::InvalidDate);
                    None
                }
            },
        };

        let category_id = match self.category.as_deref() {
            None | Some("") => {
                errors.category = Some(FieldError::Missing);
                None
            }
            Some(category) => match category.parse::<CategoryId>() {
                Ok(category_id) => Some(category_id),
                Err(_) => {
                    errors.category = Some(FieldError::UnknownCategory);
                    None
                }
            },
        };

        match (kind, amount, date, category_id) {
            (Some(kind), Some(amount), Some(date), Some(category_id)) => Ok(ValidatedTransaction {
                category_id,
                amount,
                date,
                kind,
            }),
            _ => Err(errors),
        }
    }
}

/// Whether the form creates a new transaction or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    /// POST to the transactions collection.
    Create,
    /// PUT to the transaction with this ID.
    Edit(TransactionId),
}

/// The transaction form.
///
/// The form keeps the submitted values and shows per-field error messages
/// when `errors` is non-empty, so the user can correct a rejected submission
/// in place.
pub fn transaction_form(
    action: FormAction,
    categories: &[Category],
    values: &TransactionFormData,
    errors: &ValidationErrors,
) -> Markup {
    let (hx_post, hx_put, submit_label) = match action {
        FormAction::Create => (
            Some(endpoints::TRANSACTIONS_API.to_owned()),
            None,
            "Add transaction",
        ),
        FormAction::Edit(transaction_id) => (
            None,
            Some(endpoints::format_endpoint(
                endpoints::TRANSACTION,
                transaction_id,
            )),
            "Save changes",
        ),
    };

    html! {
        form
            id="transaction-form"
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target="#transaction-block"
            hx-swap="innerHTML"
            class="w-full max-w-md space-y-4"
        {
            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }
                select name="type" id="type" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for kind in [TransactionType::Income, TransactionType::Expense] {
                        option
                            value=(kind)
                            selected[values.kind.as_deref() == Some(kind.as_str())]
                        {
                            @match kind {
                                TransactionType::Income => { "Income" }
                                TransactionType::Expense => { "Expense" }
                            }
                        }
                    }
                }
                @if let Some(error) = errors.kind {
                    p class=(FORM_ERROR_STYLE) { (error.message()) }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    value=[values.amount.as_deref()]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
                @if let Some(error) = errors.amount {
                    p class=(FORM_ERROR_STYLE) { (error.message()) }
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input
                    name="date"
                    id="date"
                    type="date"
                    value=[values.date.as_deref()]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
                @if let Some(error) = errors.date {
                    p class=(FORM_ERROR_STYLE) { (error.message()) }
                }
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select name="category" id="category" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select a category" }
                    @for category in categories {
                        option
                            value=(category.id)
                            selected[values.category.as_deref() == Some(&category.id.to_string())]
                        {
                            (category.name)
                        }
                    }
                }
                @if let Some(error) = errors.category {
                    p class=(FORM_ERROR_STYLE) { (error.message()) }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}

impl TransactionFormData {
    /// Pre-fill the form with an existing transaction's values.
    pub fn from_transaction(transaction: &super::core::Transaction) -> Self {
        Self {
            kind: Some(transaction.kind.to_string()),
            amount: Some(format!("{:.2}", transaction.amount)),
            date: Some(transaction.date.to_string()),
            category: Some(transaction.category_id.to_string()),
        }
    }
}

#[cfg(test)]
mod validation_tests {
    use time::macros::date;

    use crate::transaction::TransactionType;

    use super::{FieldError, TransactionFormData};

    fn valid_form() -> TransactionFormData {
        TransactionFormData {
            kind: Some("expense".to_owned()),
            amount: Some("12.50".to_owned()),
            date: Some("2024-01-10".to_owned()),
            category: Some("3".to_owned()),
        }
    }

    #[test]
    fn accepts_a_valid_form() {
        let validated = valid_form().validate().unwrap();

        assert_eq!(validated.kind, TransactionType::Expense);
        assert_eq!(validated.amount, 12.50);
        assert_eq!(validated.date, date!(2024 - 01 - 10));
        assert_eq!(validated.category_id, 3);
    }

    #[test]
    fn rounds_amount_to_whole_cents() {
        let form = TransactionFormData {
            amount: Some("12.505".to_owned()),
            ..valid_form()
        };

        let validated = form.validate().unwrap();

        assert_eq!(validated.amount, 12.51);
    }

    #[test]
    fn rejects_negative_and_zero_amounts() {
        for amount in ["-50.00", "0", "0.001"] {
            let form = TransactionFormData {
                amount: Some(amount.to_owned()),
                ..valid_form()
            };

            let errors = form.validate().unwrap_err();

            assert_eq!(errors.amount, Some(FieldError::NotPositive), "{amount}");
        }
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        for amount in ["twelve", "NaN", "inf"] {
            let form = TransactionFormData {
                amount: Some(amount.to_owned()),
                ..valid_form()
            };

            let errors = form.validate().unwrap_err();

            assert_eq!(errors.amount, Some(FieldError::NotANumber), "{amount}");
        }
    }

    #[test]
    fn rejects_invalid_dates() {
        for date in ["2024-13-01", "10/01/2024", "yesterday"] {
            let form = TransactionFormData {
                date: Some(date.to_owned()),
                ..valid_form()
            };

            let errors = form.validate().unwrap_err();

            assert_eq!(errors.date, Some(FieldError::InvalidDate), "{date}");
        }
    }

    #[test]
    fn reports_all_missing_fields_at_once() {
        let errors = TransactionFormData::default().validate().unwrap_err();

        assert_eq!(errors.kind, Some(FieldError::Missing));
        assert_eq!(errors.amount, Some(FieldError::Missing));
        assert_eq!(errors.date, Some(FieldError::Missing));
        assert_eq!(errors.category, Some(FieldError::Missing));
    }

    #[test]
    fn rejects_unknown_type() {
        let form = TransactionFormData {
            kind: Some("transfer".to_owned()),
            ..valid_form()
        };

        let errors = form.validate().unwrap_err();

        assert_eq!(errors.kind, Some(FieldError::UnknownType));
    }
}
