use reqwest::Method;
use serde_json::{json, Value};
use url::Url;

use super::{
    validate, ApiResponse, Fields, Filter, ObjectInfo, ObjectSchema, ReqwestTransport, Transport,
    HttpRequest,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::oauth::{obtain_access_token, AccessToken, Credentials};

pub const CUSTOM_OBJECTS_PATH: &str = "/rest/v1/customobjects.json";
pub const LEADS_PATH: &str = "/rest/v1/leads.json";
pub const LEAD_DESCRIBE_PATH: &str = "/rest/v1/leads/describe2.json";

/// API name of the custom object describing a snap release.
pub const SNAP_OBJECT: &str = "snap_c";

/// The field `get_snap` looks snaps up by.
pub const SNAP_ID_FIELD: &str = "marketoGUID";

/// Fields requested whenever snaps are fetched.
pub const SNAP_FIELDS: [&str; 8] = [
    "emailAddress",
    "snapName",
    "revision",
    "Confinement",
    "channel",
    "marketoGUID",
    "createdAt",
    "updatedAt",
];

/// Keys `get_snaps` may filter on.
pub const SNAP_SEARCH_FIELDS: [&str; 3] = ["marketoGUID", "snapName", "emailAddress"];

/// Keys `delete_snap` may filter on; these are the snap's dedupe fields.
pub const SNAP_DELETE_FIELDS: [&str; 1] = ["snapName"];

/// Joins `path` onto the service root and appends the token and any
/// extra query parameters, in that order.
pub fn compose_url(
    service_root: &Url,
    path: &str,
    access_token: &str,
    params: &[(&str, String)],
) -> Result<Url> {
    let mut url = service_root.join(path)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("access_token", access_token);
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}

/// A client for the REST API.
///
/// The access token is fetched on the first call that needs one and
/// reused afterwards until the identity endpoint's `expires_in` runs out.
pub struct ApiClient<T: Transport = ReqwestTransport> {
    transport: T,
    service_root: Url,
    credentials: Credentials,
    lead_overrides: Fields,
    token: Option<AccessToken>,
    /// Lead fields discovered via `describe_lead`, used by `get_lead`.
    lead_fields: Option<Vec<String>>,
}

impl ApiClient<ReqwestTransport> {
    /// Creates a client talking to the real service.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(ReqwestTransport::new()?, config))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            service_root: config.service_root.clone(),
            credentials: config.credentials(),
            lead_overrides: config.lead.overrides.clone(),
            token: None,
            lead_fields: None,
        }
    }

    /// Returns the cached access token, fetching a new one if there is
    /// none yet or the old one has expired.
    pub async fn token(&mut self) -> Result<String> {
        if let Some(token) = self.token.as_ref().filter(|token| !token.is_expired()) {
            return Ok(token.as_str().to_string());
        }

        let token =
            obtain_access_token(&self.transport, &self.service_root, &self.credentials).await?;
        let value = token.as_str().to_string();
        self.token = Some(token);
        Ok(value)
    }

    /// Builds the fully-qualified, authenticated URL for `path`.
    pub async fn build_url(&mut self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let token = self.token().await?;
        compose_url(&self.service_root, path, &token, params)
    }

    /// Issues one call and validates its response.
    pub async fn invoke(
        &mut self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        let url = self.build_url(path, params).await?;
        let response = self
            .transport
            .execute(HttpRequest {
                method: method.clone(),
                url,
                body,
            })
            .await?;
        validate(&method, response.status, &response.body)
    }

    async fn get(&mut self, path: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        self.invoke(Method::GET, path, params, None).await
    }

    async fn post(&mut self, path: &str, body: Value) -> Result<ApiResponse> {
        self.invoke(Method::POST, path, &[], Some(body)).await
    }

    /// Lists the custom object types defined in the instance.
    pub async fn list_objects(&mut self) -> Result<ApiResponse> {
        self.get(CUSTOM_OBJECTS_PATH, &[]).await
    }

    pub async fn describe_object(&mut self, name: &str) -> Result<ApiResponse> {
        let path = format!("/rest/v1/customobjects/{}/describe.json", segment(name)?);
        self.get(&path, &[]).await
    }

    pub async fn describe_lead(&mut self) -> Result<ApiResponse> {
        let response = self.get(LEAD_DESCRIBE_PATH, &[]).await?;
        let schema = ObjectSchema::from_response(&response)?;
        self.lead_fields = Some(schema.available_fields());
        Ok(response)
    }

    pub async fn lead_info(&mut self) -> Result<ObjectInfo> {
        let response = self.describe_lead().await?;
        Ok(ObjectSchema::from_response(&response)?.info())
    }

    /// Creates or updates a lead; configured overrides win over `fields`.
    pub async fn set_lead(&mut self, fields: &Fields) -> Result<ApiResponse> {
        let mut lead = fields.clone();
        lead.extend(self.lead_overrides.clone());
        self.post(LEADS_PATH, json!({ "input": [lead] })).await
    }

    /// Fetches one lead, asking only for the fields `describe_lead` reported
    /// as available.
    pub async fn get_lead(&mut self, id: &str) -> Result<ApiResponse> {
        let fields = match &self.lead_fields {
            Some(fields) => fields.clone(),
            None => {
                self.describe_lead().await?;
                self.lead_fields.clone().unwrap_or_default()
            }
        };
        let path = format!("/rest/v1/lead/{}.json", segment(id)?);
        self.get(&path, &[("fields", fields.join(","))]).await
    }

    pub async fn describe_snap(&mut self) -> Result<ApiResponse> {
        self.describe_object(SNAP_OBJECT).await
    }

    /// Also warns when the snap schema no longer supports the fixed filter keys.
    pub async fn snap_info(&mut self) -> Result<ObjectInfo> {
        let response = self.describe_snap().await?;
        let schema = ObjectSchema::from_response(&response)?;
        for mismatch in
            schema.filter_mismatches(SNAP_ID_FIELD, &SNAP_SEARCH_FIELDS, &SNAP_DELETE_FIELDS)
        {
            tracing::warn!(object = SNAP_OBJECT, "{mismatch}");
        }
        Ok(schema.info())
    }

    pub async fn set_snap(&mut self, fields: &Fields) -> Result<ApiResponse> {
        self.post(&snap_path(), json!({ "input": [fields] })).await
    }

    /// Fetches one snap by its `marketoGUID`.
    pub async fn get_snap(&mut self, guid: &str) -> Result<ApiResponse> {
        self.query_snaps("idField", guid).await
    }

    /// Fetches the snaps matching a single searchable field.
    pub async fn get_snaps(&mut self, filter: &Fields) -> Result<ApiResponse> {
        let filter = Filter::from_fields(filter, &SNAP_SEARCH_FIELDS)?;
        self.query_snaps(&filter.field, &filter.value).await
    }

    /// Deletes the snaps matching a single dedupe field.
    pub async fn delete_snap(&mut self, filter: &Fields) -> Result<ApiResponse> {
        let filter = Filter::from_fields(filter, &SNAP_DELETE_FIELDS)?;
        let path = format!("/rest/v1/customobjects/{SNAP_OBJECT}/delete.json");
        let body = json!({
            "deleteBy": "dedupeFields",
            "input": [{ filter.field: filter.value }],
        });
        self.post(&path, body).await
    }

    async fn query_snaps(&mut self, filter_type: &str, value: &str) -> Result<ApiResponse> {
        let params = [
            ("filterType", filter_type.to_string()),
            ("filterValues", value.to_string()),
            ("fields", SNAP_FIELDS.join(",")),
        ];
        self.get(&snap_path(), &params).await
    }
}

fn snap_path() -> String {
    format!("/rest/v1/customobjects/{SNAP_OBJECT}.json")
}

/// Escapes a caller-supplied value for use as a single path segment.
fn segment(value: &str) -> Result<String> {
    if matches!(value, "" | "." | "..") {
        return Err(Error::Usage(format!("`{value}` is not a valid identifier")));
    }
    let mut scratch = Url::parse("http://segment.invalid/")?;
    scratch
        .path_segments_mut()
        .map_err(|()| Error::Usage(format!("`{value}` is not a valid identifier")))?
        .pop_if_empty()
        .push(value);
    Ok(scratch.path().trim_start_matches('/').to_string())
}
