use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::error::Result;
use crate::models::user::User;
use crate::utils::validation::{CREATE_USER, UPDATE_USER};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateUserPayload {
    #[schema(min_length = 2, max_length = 50, example = "Jo")]
    pub name: String,
    #[schema(example = "a@b.com")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(minimum = 0, maximum = 150)]
    pub age: Option<i64>,
}

impl CreateUserPayload {
    pub fn from_json(value: &Value) -> Result<Self> {
        CREATE_USER.parse(value)
    }
}

impl Validate for CreateUserPayload {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut value = json!({ "name": self.name, "email": self.email });
        if let Some(age) = self.age {
            value["age"] = json!(age);
        }
        CREATE_USER.apply(&value).map(|_| ())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(min_length = 2, max_length = 50)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(minimum = 0, maximum = 150)]
    pub age: Option<i64>,
}

impl UpdateUserPayload {
    pub fn from_json(value: &Value) -> Result<Self> {
        UPDATE_USER.parse(value)
    }
}

impl Validate for UpdateUserPayload {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut value = json!({});
        if let Some(name) = &self.name {
            value["name"] = json!(name);
        }
        if let Some(email) = &self.email {
            value["email"] = json!(email);
        }
        if let Some(age) = self.age {
            value["age"] = json!(age);
        }
        UPDATE_USER.apply(&value).map(|_| ())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserListQuery {
    pub id: Option<String>,
}

impl UserListQuery {
    /// `?id=` with an empty value lists everything.
    pub fn id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Success envelope shared by every user endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            count: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<Vec<User>> {
    pub fn list(users: Vec<User>) -> Self {
        Self {
            success: true,
            message: None,
            count: Some(users.len()),
            data: Some(users),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_is_normalized() {
        let payload =
            CreateUserPayload::from_json(&json!({ "name": " Jo ", "email": "A@B.com", "age": "30" }))
                .unwrap();
        assert_eq!(
            payload,
            CreateUserPayload {
                name: "Jo".into(),
                email: "a@b.com".into(),
                age: Some(30),
            }
        );
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn typed_payload_revalidates() {
        let payload = UpdateUserPayload {
            name: Some("J".into()),
            ..Default::default()
        };
        assert!(payload.validate().is_err());
        assert!(UpdateUserPayload::default().validate().is_ok());
    }

    #[test]
    fn list_envelope_counts_items() {
        let body = serde_json::to_value(ApiResponse::<Vec<User>>::list(Vec::new())).unwrap();
        assert_eq!(body, json!({ "success": true, "count": 0, "data": [] }));
    }

    #[test]
    fn blank_id_query_means_list() {
        let query = UserListQuery {
            id: Some("  ".into()),
        };
        assert_eq!(query.id(), None);
    }
}
