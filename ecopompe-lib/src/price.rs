use chrono::NaiveDate;
use convert_case::{Case, Casing};
use ordered_float::NotNan;
use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;
use crate::{EcoPompeError, FuelType};

#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub struct Price {
    pub fuel: FuelType,
    pub updated: NaiveDate,
    pub value: NotNan<f32>,
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        let mut s = serializer.serialize_struct("Price", 4)?;
        let id = format!("{}", self.fuel);
        s.serialize_field("id", &id.to_case(Case::Snake))?;
        s.serialize_field("label", &self.fuel.to_string())?;
        s.serialize_field("updated", &self.updated)?;
        s.serialize_field("value", &self.value.into_inner())?;
        s.end()
    }
}

impl Price {
    pub fn try_new(fuel: FuelType, updated: NaiveDate, value: f32) -> Result<Self, EcoPompeError> {
        let value = NotNan::new(value).map_err(|_| EcoPompeError::InvalidPrice(fuel))?;
        Ok(Self {
            fuel,
            updated,
            value,
        })
    }

    /// Whole days elapsed between the last update and `today`.
    pub fn age_in_days(&self, today: NaiveDate) -> i64 {
        (today - self.updated).num_days()
    }
}
