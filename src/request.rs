//! Request details draft, validation and content addressing
use super::error::ValidationError;
use chrono::{DateTime, TimeZone, Utc};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Eq, PartialEq)]
pub enum ResourceType {
    #[n(0)]
    Equipment,
    #[n(1)]
    Software,
    #[n(2)]
    Supplies,
    #[n(3)]
    Services,
    #[n(4)]
    Infrastructure,
    #[n(5)]
    Other,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Eq, Ord, PartialEq, PartialOrd)]
pub enum Priority {
    #[n(0)]
    Low,
    #[n(1)]
    Medium,
    #[n(2)]
    High,
    #[n(3)]
    Urgent,
}

// Also used for constructing drafts
// Key is the hash of this struct encoded into CBOR
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, Eq, PartialEq)]
pub struct RequestDetails {
    // No ID field, as the ID *is* the hash of this struct
    #[n(0)]
    title: Option<String>,
    #[n(1)]
    description: Option<String>,
    #[n(2)]
    resource_type: Option<ResourceType>,
    #[n(3)]
    quantity: u64,
    #[n(4)]
    estimated_cost: u64, // integer minor units
    #[n(5)]
    priority: Option<Priority>,
    #[n(6)]
    department_id: Option<String>,
}

#[derive(Debug, Clone, Eq, Ord, PartialEq, PartialOrd)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl RequestDetails {
    /// Construct a new builder object, this becomes the basis for a draft
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
    pub fn set_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }
    pub fn set_quantity(mut self, quantity: u64) -> Self {
        self.quantity = quantity;
        self
    }
    pub fn set_estimated_cost(mut self, estimated_cost: u64) -> Self {
        self.estimated_cost = estimated_cost;
        self
    }
    pub fn set_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
    pub fn set_department(mut self, department_id: &str) -> Self {
        self.department_id = Some(department_id.to_string());
        self
    }

    // Checks every required field, then returns the sha256 content hash of
    // the draft together with its CBOR encoding.
    pub fn validate_and_finalise(&self) -> anyhow::Result<(String, Vec<u8>)> {
        if self.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(ValidationError::MissingTitle.into());
        }
        if self
            .description
            .as_deref()
            .is_none_or(|d| d.trim().is_empty())
        {
            return Err(ValidationError::MissingDescription.into());
        }
        if self.resource_type.is_none() {
            return Err(ValidationError::MissingResourceType.into());
        }
        if self.quantity == 0 {
            return Err(ValidationError::ZeroQuantity.into());
        }
        if self.estimated_cost == 0 {
            return Err(ValidationError::ZeroEstimatedCost.into());
        }
        if self.priority.is_none() {
            return Err(ValidationError::MissingPriority.into());
        }
        if self
            .department_id
            .as_deref()
            .is_none_or(|d| d.trim().is_empty())
        {
            return Err(ValidationError::MissingDepartment.into());
        }

        let contents = minicbor::to_vec(self)?;
        let hash = sha256::digest(&contents);

        Ok((hash, contents))
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}
