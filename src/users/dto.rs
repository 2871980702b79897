use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::users::repo::User;

/// Request body for registration. Everything is optional at the type level;
/// the handler enforces which fields are required.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub city: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<Value>,
    pub portfolio: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Partial profile update. Which fields actually apply is decided by
/// `into_set_document`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub city: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<Value>,
    pub portfolio: Option<String>,
    #[serde(rename = "profilePic")]
    pub profile_pic: Option<String>,
}

impl UpdateProfileRequest {
    /// Build the `$set` document for a partial update. `name`, `city`,
    /// `skills` and `portfolio` apply only when present AND non-empty;
    /// `experience` and `profilePic` apply whenever present, zero and
    /// empty string included. An empty string therefore cannot clear
    /// `name`, `city` or `portfolio`, but can clear `profilePic`.
    pub fn into_set_document(self) -> Document {
        let mut set = Document::new();
        if let Some(name) = self.name.filter(|s| !s.is_empty()) {
            set.insert("name", name);
        }
        if let Some(city) = self.city.filter(|s| !s.is_empty()) {
            set.insert("city", city);
        }
        if let Some(skills) = self.skills.filter(|s| !s.is_empty()) {
            set.insert("skills", normalize_skills(&skills));
        }
        if let Some(experience) = self.experience {
            set.insert("experience", coerce_experience(&experience));
        }
        if let Some(portfolio) = self.portfolio.filter(|s| !s.is_empty()) {
            set.insert("portfolio", portfolio);
        }
        if let Some(pic) = self.profile_pic {
            set.insert("profilePic", pic);
        }
        set
    }
}

/// Response for a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub message: &'static str,
    pub uid: String,
}

/// Response for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: Profile,
}

/// Outbound view of a user record: `password` is stripped by construction
/// and the store id is exposed as the public `uid`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub city: String,
    pub skills: Vec<String>,
    pub experience: f64,
    pub portfolio: String,
    pub profile_pic: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            uid: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name,
            email: user.email,
            city: user.city,
            skills: user.skills,
            experience: user.experience,
            portfolio: user.portfolio,
            profile_pic: user.profile_pic,
            created_at: user.created_at.to_time_0_3(),
        }
    }
}

/// Split a comma-separated skills string, trimming whitespace and dropping
/// empty entries.
pub fn normalize_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Coerce the `experience` input to a number: numbers pass through, numeric
/// strings parse, anything else falls back to 0.
pub fn coerce_experience(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn skills_are_split_trimmed_and_compacted() {
        assert_eq!(normalize_skills("a, b ,,c"), vec!["a", "b", "c"]);
        assert_eq!(normalize_skills(""), Vec::<String>::new());
        assert_eq!(normalize_skills(" , , "), Vec::<String>::new());
        assert_eq!(normalize_skills("solo"), vec!["solo"]);
    }

    #[test]
    fn experience_coercion_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_experience(&json!(3)), 3.0);
        assert_eq!(coerce_experience(&json!(2.5)), 2.5);
        assert_eq!(coerce_experience(&json!("4")), 4.0);
        assert_eq!(coerce_experience(&json!(" 1.5 ")), 1.5);
    }

    #[test]
    fn experience_coercion_falls_back_to_zero() {
        assert_eq!(coerce_experience(&json!("several")), 0.0);
        assert_eq!(coerce_experience(&json!(null)), 0.0);
        assert_eq!(coerce_experience(&json!(["3"])), 0.0);
    }

    fn full_update() -> UpdateProfileRequest {
        serde_json::from_value(json!({
            "name": "Ada",
            "city": "London",
            "skills": "rust, sql ,,tokio",
            "experience": "2",
            "portfolio": "https://ada.dev",
            "profilePic": "https://ada.dev/pic.png"
        }))
        .unwrap()
    }

    #[test]
    fn update_set_carries_every_present_field() {
        let set = full_update().into_set_document();
        assert_eq!(set.get_str("name").unwrap(), "Ada");
        assert_eq!(set.get_str("city").unwrap(), "London");
        assert_eq!(set.get_array("skills").unwrap().len(), 3);
        assert_eq!(set.get_f64("experience").unwrap(), 2.0);
        assert_eq!(set.get_str("portfolio").unwrap(), "https://ada.dev");
        assert_eq!(set.get_str("profilePic").unwrap(), "https://ada.dev/pic.png");
    }

    #[test]
    fn empty_strings_do_not_clear_name_city_skills_or_portfolio() {
        let req: UpdateProfileRequest = serde_json::from_value(json!({
            "name": "", "city": "", "skills": "", "portfolio": ""
        }))
        .unwrap();
        assert!(req.into_set_document().is_empty());
    }

    #[test]
    fn experience_and_profile_pic_apply_even_when_falsy() {
        let req: UpdateProfileRequest = serde_json::from_value(json!({
            "experience": 0, "profilePic": ""
        }))
        .unwrap();
        let set = req.into_set_document();
        assert_eq!(set.get_f64("experience").unwrap(), 0.0);
        assert_eq!(set.get_str("profilePic").unwrap(), "");
    }

    #[test]
    fn absent_fields_produce_an_empty_set() {
        let req: UpdateProfileRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.into_set_document().is_empty());
    }

    fn sample_user() -> User {
        User {
            id: Some(ObjectId::parse_str("0123456789abcdef01234567").unwrap()),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "$argon2id$stub".into(),
            city: "London".into(),
            skills: vec!["rust".into()],
            experience: 3.0,
            portfolio: String::new(),
            profile_pic: String::new(),
            created_at: mongodb::bson::DateTime::now(),
        }
    }

    #[test]
    fn profile_strips_password_and_remaps_the_id() {
        let profile = Profile::from(sample_user());
        let value = serde_json::to_value(&profile).unwrap();

        assert_eq!(value["uid"], "0123456789abcdef01234567");
        assert!(value.get("password").is_none());
        assert!(value.get("_id").is_none());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn profile_serializes_wire_field_names() {
        let value = serde_json::to_value(Profile::from(sample_user())).unwrap();
        assert!(value.get("profilePic").is_some());
        assert!(value["createdAt"].is_string());
        assert_eq!(value["experience"], 3.0);
    }
}
