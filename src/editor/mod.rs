//! Room record editor
//!
//! A form over every editable field of a room. Saving validates the form
//! and merges it into the record; the polygon is never touched here.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{floor_name, RoomRecord, StatusMap, DEFAULT_PAYMENT_TYPE, DEFAULT_STATUS};

/// Storage format of entry/exit dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Tax IDs are at most 12 digits
pub const INN_MAX_LEN: usize = 12;

static INN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{0,12}$").expect("valid INN pattern"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("Room number cannot be empty")]
    EmptyNumber,

    #[error("Exit date cannot be earlier than entry date")]
    ExitBeforeEntry,

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Tax ID must be up to 12 digits")]
    InvalidInn,
}

/// Editable fields, in the order the editor shows them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Number,
    Inn,
    ClientName,
    RenterName,
    PaymentType,
    EntryDate,
    ExitDate,
    Status,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Number,
        Field::Inn,
        Field::ClientName,
        Field::RenterName,
        Field::PaymentType,
        Field::EntryDate,
        Field::ExitDate,
        Field::Status,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Number => "Номер кабинета",
            Field::Inn => "ИНН арендатора",
            Field::ClientName => "Имя арендатора",
            Field::RenterName => "Юридическое наименование арендатора",
            Field::PaymentType => "Тип оплаты",
            Field::EntryDate => "Дата заезда",
            Field::ExitDate => "Дата выезда",
            Field::Status => "Статус",
        }
    }

    /// Fields picked from a fixed list rather than typed
    pub fn is_choice(&self) -> bool {
        matches!(self, Field::PaymentType | Field::Status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomForm {
    /// Read-only floor name shown at the top
    pub floor_label: String,
    pub number: String,
    pub inn: String,
    pub client_name: String,
    pub renter_name: String,
    pub payment_type: String,
    pub entry_date: String,
    pub exit_date: String,
    pub status: String,
}

impl RoomForm {
    /// Fill the form from a record
    ///
    /// Dates that are missing, malformed or in the future show as `today`.
    pub fn from_room(room: &RoomRecord, today: NaiveDate) -> Self {
        Self {
            floor_label: floor_name(&room.floor),
            number: room.number.clone(),
            inn: room.inn.clone(),
            client_name: room.client_name.clone(),
            renter_name: room.renter().to_string(),
            payment_type: if room.payment_type.is_empty() {
                DEFAULT_PAYMENT_TYPE.to_string()
            } else {
                room.payment_type.clone()
            },
            entry_date: display_date(&room.entry_date, today),
            exit_date: display_date(&room.exit_date, today),
            status: room.status.clone(),
        }
    }

    /// Fill the form with the stored strings as they are
    ///
    /// For edits that never show the form: only a date that was never set
    /// becomes `today`, future and past dates are kept.
    pub fn from_room_raw(room: &RoomRecord, today: NaiveDate) -> Self {
        let unset_or = |stored: &str| {
            if stored.trim().is_empty() {
                today.format(DATE_FORMAT).to_string()
            } else {
                stored.to_string()
            }
        };
        Self {
            entry_date: unset_or(&room.entry_date),
            exit_date: unset_or(&room.exit_date),
            payment_type: room.payment_type.clone(),
            ..Self::from_room(room, today)
        }
    }

    /// Dialog title
    pub fn title(&self) -> String {
        if self.number.is_empty() || self.number == "Новый" {
            "Введите данные о кабинете".to_string()
        } else {
            format!("Информация о кабинете № {} на {}", self.number, self.floor_label)
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Number => &self.number,
            Field::Inn => &self.inn,
            Field::ClientName => &self.client_name,
            Field::RenterName => &self.renter_name,
            Field::PaymentType => &self.payment_type,
            Field::EntryDate => &self.entry_date,
            Field::ExitDate => &self.exit_date,
            Field::Status => &self.status,
        }
    }

    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Number => &mut self.number,
            Field::Inn => &mut self.inn,
            Field::ClientName => &mut self.client_name,
            Field::RenterName => &mut self.renter_name,
            Field::PaymentType => &mut self.payment_type,
            Field::EntryDate => &mut self.entry_date,
            Field::ExitDate => &mut self.exit_date,
            Field::Status => &mut self.status,
        }
    }

    /// Typed input for a text field; the tax ID only takes up to 12 digits
    pub fn push_char(&mut self, field: Field, c: char) -> bool {
        if field.is_choice() {
            return false;
        }
        if field == Field::Inn && (!c.is_ascii_digit() || self.inn.len() >= INN_MAX_LEN) {
            return false;
        }
        self.field_mut(field).push(c);
        true
    }

    pub fn pop_char(&mut self, field: Field) {
        if !field.is_choice() {
            self.field_mut(field).pop();
        }
    }

    /// Step a choice field through its options
    pub fn cycle(&mut self, field: Field, statuses: &StatusMap, forward: bool) {
        let options: Vec<&str> = match field {
            Field::PaymentType => crate::models::PAYMENT_TYPES.to_vec(),
            Field::Status => statuses.names().collect(),
            _ => return,
        };
        if options.is_empty() {
            return;
        }
        let current = options.iter().position(|o| *o == self.get(field));
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % options.len(),
            (Some(i), false) => (i + options.len() - 1) % options.len(),
            (None, _) => 0,
        };
        *self.field_mut(field) = options[next].to_string();
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        if self.number.trim().is_empty() {
            return Err(EditorError::EmptyNumber);
        }
        if !INN_PATTERN.is_match(&self.inn) {
            return Err(EditorError::InvalidInn);
        }
        let entry = parse_date(&self.entry_date)?;
        let exit = parse_date(&self.exit_date)?;
        if exit < entry {
            return Err(EditorError::ExitBeforeEntry);
        }
        Ok(())
    }

    /// Merge the form into `room`; points and floor are kept
    pub fn apply_to(&self, room: &mut RoomRecord) {
        room.number = self.number.clone();
        room.inn = self.inn.clone();
        room.client_name = self.client_name.clone();
        room.renter_name = Some(self.renter_name.clone());
        room.payment_type = self.payment_type.clone();
        room.entry_date = self.entry_date.clone();
        room.exit_date = self.exit_date.clone();
        room.status = self.status.clone();
    }
}

/// Reset all tenant fields; number and polygon stay
pub fn clear_room(room: &mut RoomRecord, today: NaiveDate) {
    let today = today.format(DATE_FORMAT).to_string();
    room.inn.clear();
    room.client_name.clear();
    room.renter_name = Some(String::new());
    room.payment_type = DEFAULT_PAYMENT_TYPE.to_string();
    room.entry_date = today.clone();
    room.exit_date = today;
    room.status = DEFAULT_STATUS.to_string();
}

pub fn parse_date(s: &str) -> Result<NaiveDate, EditorError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| EditorError::InvalidDate(s.to_string()))
}

fn display_date(stored: &str, today: NaiveDate) -> String {
    match parse_date(stored) {
        Ok(date) if date <= today => date.format(DATE_FORMAT).to_string(),
        _ => today.format(DATE_FORMAT).to_string(),
    }
}
