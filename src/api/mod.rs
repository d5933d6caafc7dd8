mod client;
mod record;
mod response;
mod schema;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{
    compose_url, ApiClient, LEADS_PATH, LEAD_DESCRIBE_PATH, SNAP_DELETE_FIELDS, SNAP_FIELDS,
    SNAP_ID_FIELD, SNAP_OBJECT, SNAP_SEARCH_FIELDS,
};
pub use record::{parse_field_spec, FieldValue, Fields, Filter};
pub use response::{validate, ApiResponse, Reason, ACCEPTED_STATUSES};
pub use schema::{FieldDescriptor, ObjectInfo, ObjectSchema};
pub use transport::{
    redacted, redacted_body, HttpRequest, HttpResponse, ReqwestTransport, Transport,
};
