//! Prediction form state, kept apart from rendering so it can be tested
//! without a terminal.

use crate::domain::{LEASE_COMMENCE_MIN, PredictionRequest};
use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Street,
    Block,
    FloorArea,
    LeaseCommence,
    StoreyRange,
    Submit,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Street,
        Field::Block,
        Field::FloorArea,
        Field::LeaseCommence,
        Field::StoreyRange,
        Field::Submit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Street => "Street name",
            Field::Block => "Block",
            Field::FloorArea => "Floor area (sqm)",
            Field::LeaseCommence => "Lease commenced",
            Field::StoreyRange => "Storey range",
            Field::Submit => "Predict",
        }
    }

    fn is_text(self) -> bool {
        matches!(self, Field::FloorArea | Field::LeaseCommence | Field::StoreyRange)
    }
}

pub struct Form {
    addresses: Vec<String>,
    blocks: Vec<String>,
    street_idx: usize,
    block_idx: usize,
    floor_area: String,
    lease_commence: String,
    storey_range: String,
    lease_max: i32,
    selected: usize,
    edit_buffer: Option<String>,
}

impl Form {
    pub fn new(addresses: Vec<String>, blocks: Vec<String>, lease_max: i32) -> Self {
        let lease_max = lease_max.max(LEASE_COMMENCE_MIN);
        let lease_default = 1990_i32.clamp(LEASE_COMMENCE_MIN, lease_max);
        Self {
            addresses,
            blocks,
            street_idx: 0,
            block_idx: 0,
            floor_area: "90".to_string(),
            lease_commence: lease_default.to_string(),
            storey_range: "01 TO 03".to_string(),
            lease_max,
            selected: 0,
            edit_buffer: None,
        }
    }

    pub fn selected(&self) -> Field {
        Field::ALL[self.selected]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn is_editing(&self) -> bool {
        self.edit_buffer.is_some()
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < Field::ALL.len() {
            self.selected += 1;
        }
    }

    /// Step the selected field: cycle street/block, move the lease year,
    /// or nudge the floor area by whole square metres.
    pub fn adjust(&mut self, delta: i32) {
        match self.selected() {
            Field::Street => self.street_idx = cycle(self.street_idx, self.addresses.len(), delta),
            Field::Block => self.block_idx = cycle(self.block_idx, self.blocks.len(), delta),
            Field::LeaseCommence => {
                if let Ok(year) = self.lease_commence.trim().parse::<i32>() {
                    let next = (year + delta).clamp(LEASE_COMMENCE_MIN, self.lease_max);
                    self.lease_commence = next.to_string();
                }
            }
            Field::FloorArea => {
                if let Ok(area) = self.floor_area.trim().parse::<f64>() {
                    let next = (area + f64::from(delta)).max(1.0);
                    self.floor_area = format!("{next}");
                }
            }
            Field::StoreyRange | Field::Submit => {}
        }
    }

    /// Start editing the selected text field. Returns `false` for fields
    /// that are only cycled.
    pub fn begin_edit(&mut self) -> bool {
        let field = self.selected();
        if !field.is_text() {
            return false;
        }
        self.edit_buffer = Some(self.text_value(field).to_string());
        true
    }

    pub fn cancel_edit(&mut self) {
        self.edit_buffer = None;
    }

    pub fn commit_edit(&mut self) {
        let Some(buffer) = self.edit_buffer.take() else {
            return;
        };
        match self.selected() {
            Field::FloorArea => self.floor_area = buffer,
            Field::LeaseCommence => self.lease_commence = buffer,
            Field::StoreyRange => self.storey_range = buffer,
            _ => {}
        }
    }

    pub fn push_char(&mut self, c: char) {
        let field = self.selected();
        let Some(buffer) = self.edit_buffer.as_mut() else {
            return;
        };
        let accepted = match field {
            Field::FloorArea => c.is_ascii_digit() || c == '.',
            Field::LeaseCommence => c.is_ascii_digit(),
            _ => !c.is_control(),
        };
        if accepted {
            buffer.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(buffer) = self.edit_buffer.as_mut() {
            buffer.pop();
        }
    }

    pub fn display_value(&self, field: Field) -> String {
        if field == self.selected() {
            if let Some(buffer) = &self.edit_buffer {
                return format!("{buffer}_");
            }
        }
        match field {
            Field::Street => choice(&self.addresses, self.street_idx),
            Field::Block => choice(&self.blocks, self.block_idx),
            Field::LeaseCommence => format!("< {} >", self.lease_commence),
            _ => self.text_value(field).to_string(),
        }
    }

    /// Build a request from the current values. Numeric parse failures are
    /// invalid input; range checks are left to the pipeline.
    pub fn to_request(&self) -> Result<PredictionRequest, AppError> {
        let street_name = self
            .addresses
            .get(self.street_idx)
            .cloned()
            .ok_or_else(|| AppError::invalid_input("no street name available"))?;
        let block = self
            .blocks
            .get(self.block_idx)
            .cloned()
            .ok_or_else(|| AppError::invalid_input("no block available"))?;

        let floor_area_sqm = self
            .floor_area
            .trim()
            .parse::<f64>()
            .map_err(|_| AppError::invalid_input(format!("floor area must be a number, got '{}'", self.floor_area)))?;
        let lease_commence_date = self.lease_commence.trim().parse::<i32>().map_err(|_| {
            AppError::invalid_input(format!("lease commence year must be an integer, got '{}'", self.lease_commence))
        })?;

        Ok(PredictionRequest {
            street_name,
            block,
            floor_area_sqm,
            lease_commence_date,
            storey_range: self.storey_range.clone(),
        })
    }

    fn text_value(&self, field: Field) -> &str {
        match field {
            Field::FloorArea => &self.floor_area,
            Field::LeaseCommence => &self.lease_commence,
            Field::StoreyRange => &self.storey_range,
            _ => "",
        }
    }
}

fn cycle(idx: usize, len: usize, delta: i32) -> usize {
    if len == 0 {
        return 0;
    }
    (idx as i64 + i64::from(delta)).rem_euclid(len as i64) as usize
}

fn choice(items: &[String], idx: usize) -> String {
    match items.get(idx) {
        Some(item) => format!("< {item} > ({}/{})", idx + 1, items.len()),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn form() -> Form {
        Form::new(
            vec!["ANG MO KIO AVE 10".into(), "BEDOK NTH RD".into(), "TAMPINES ST 21".into()],
            vec!["101".into(), "406".into()],
            2023,
        )
    }

    #[test]
    fn street_and_block_cycle_with_wraparound() {
        let mut f = form();
        f.adjust(-1);
        assert_eq!(f.to_request().unwrap().street_name, "TAMPINES ST 21");

        f.select_next();
        assert_eq!(f.selected(), Field::Block);
        f.adjust(1);
        f.adjust(1);
        assert_eq!(f.to_request().unwrap().block, "101");
    }

    #[test]
    fn lease_year_steps_are_clamped() {
        let mut f = form();
        f.selected = 3;
        f.adjust(100);
        assert_eq!(f.to_request().unwrap().lease_commence_date, 2023);
        f.adjust(-200);
        assert_eq!(f.to_request().unwrap().lease_commence_date, LEASE_COMMENCE_MIN);
    }

    #[test]
    fn edit_filters_characters_and_commits() {
        let mut f = form();
        f.selected = 2;
        assert!(f.begin_edit());
        f.pop_char();
        f.pop_char();
        for c in "7x3.5".chars() {
            f.push_char(c);
        }
        assert_eq!(f.display_value(Field::FloorArea), "73.5_");
        f.commit_edit();
        assert!(!f.is_editing());
        assert_eq!(f.to_request().unwrap().floor_area_sqm, 73.5);
    }

    #[test]
    fn cancel_keeps_previous_value() {
        let mut f = form();
        f.selected = 4;
        assert!(f.begin_edit());
        f.push_char('!');
        f.cancel_edit();
        assert_eq!(f.to_request().unwrap().storey_range, "01 TO 03");
    }

    #[test]
    fn choice_fields_are_not_editable() {
        let mut f = form();
        assert!(!f.begin_edit());
        f.selected = 5;
        assert!(!f.begin_edit());
    }

    #[test]
    fn unparsable_floor_area_is_invalid_input() {
        let mut f = form();
        f.floor_area = ".".to_string();
        let err = f.to_request().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn empty_choices_are_reported() {
        let f = Form::new(Vec::new(), Vec::new(), 2023);
        assert_eq!(f.display_value(Field::Street), "-");
        assert!(f.to_request().is_err());
    }
}
