use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::path::FieldPath;
use crate::record::Update;

/// Operation decoded from an inbound request.
///
/// Field names follow the route segment names; [`Operation::echo`]
/// returns them verbatim as the success response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    New {
        correlation_id: String,
        source_id: String,
    },
    Queued {
        correlation_id: String,
        time_queued: String,
    },
    Update {
        correlation_id: String,
        field: String,
        value: String,
    },
    DestinationAdded {
        correlation_id: String,
        destination_id: String,
        message_id: String,
        time_queued: String,
    },
    DestinationUpdated {
        correlation_id: String,
        destination_id: String,
        message_id: String,
        field: String,
        value: String,
    },
}

impl Operation {
    /// Route name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::New { .. } => "new",
            Operation::Queued { .. } => "queued",
            Operation::Update { .. } => "update",
            Operation::DestinationAdded { .. } => "destinationAdded",
            Operation::DestinationUpdated { .. } => "destinationUpdated",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Operation::New { correlation_id, .. }
            | Operation::Queued { correlation_id, .. }
            | Operation::Update { correlation_id, .. }
            | Operation::DestinationAdded { correlation_id, .. }
            | Operation::DestinationUpdated { correlation_id, .. } => correlation_id,
        }
    }

    /// Leaf assignment performed by the operation. `None` for `New`,
    /// which inserts a whole record instead of merging.
    pub fn update(&self) -> Result<Option<Update>, StoreError> {
        let update = match self {
            Operation::New { .. } => return Ok(None),
            Operation::Queued { time_queued, .. } => {
                Update::new(FieldPath::time_queued(), time_queued.as_str())
            }
            Operation::Update { field, value, .. } => {
                Update::new(FieldPath::field(field)?, value.as_str())
            }
            Operation::DestinationAdded {
                destination_id,
                message_id,
                time_queued,
                ..
            } => Update::new(
                FieldPath::destination_time_queued(destination_id, message_id)?,
                time_queued.as_str(),
            ),
            Operation::DestinationUpdated {
                destination_id,
                message_id,
                field,
                value,
                ..
            } => Update::new(
                FieldPath::destination_field(destination_id, message_id, field)?,
                value.as_str(),
            ),
        };
        Ok(Some(update))
    }

    /// Decoded input segments keyed by route segment name.
    pub fn echo(&self) -> BTreeMap<&'static str, &str> {
        let mut params = BTreeMap::new();
        params.insert("correlationId", self.correlation_id());
        match self {
            Operation::New { source_id, .. } => {
                params.insert("sourceId", source_id.as_str());
            }
            Operation::Queued { time_queued, .. } => {
                params.insert("timeQueued", time_queued.as_str());
            }
            Operation::Update { field, value, .. } => {
                params.insert("field", field.as_str());
                params.insert("value", value.as_str());
            }
            Operation::DestinationAdded {
                destination_id,
                message_id,
                time_queued,
                ..
            } => {
                params.insert("destinationId", destination_id.as_str());
                params.insert("messageId", message_id.as_str());
                params.insert("timeQueued", time_queued.as_str());
            }
            Operation::DestinationUpdated {
                destination_id,
                message_id,
                field,
                value,
                ..
            } => {
                params.insert("destinationId", destination_id.as_str());
                params.insert("messageId", message_id.as_str());
                params.insert("field", field.as_str());
                params.insert("value", value.as_str());
            }
        }
        params
    }
}
