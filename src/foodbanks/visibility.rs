//! The single place that decides which fields of a food bank a caller may
//! see. Pure data shaping: no queries, no status codes.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::FoodBankRecord;

/// What a given caller is allowed to see of one food bank.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FoodBankView {
    Full(FoodBankFull),
    Public(FoodBankPublic),
    /// Unpublished and the caller is not the admin: serializes to `{}` so
    /// nothing leaks, not even the record's existence beyond its id route.
    Hidden(Empty),
}

#[derive(Debug, Serialize)]
pub struct Empty {}

/// Everything, admin identity included. Only ever built for the admin.
#[derive(Debug, Serialize)]
pub struct FoodBankFull {
    pub id: Uuid,
    pub name: String,
    pub unit_no: Option<String>,
    pub street: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub website: Option<String>,
    pub charity_registration_no: Option<String>,
    pub timezone: String,
    pub published: bool,
    pub admin: Uuid,
    pub admin_username: String,
    pub admin_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The published shape: the admin identity keys do not exist here at all,
/// rather than being nulled out.
#[derive(Debug, Serialize)]
pub struct FoodBankPublic {
    pub id: Uuid,
    pub name: String,
    pub unit_no: Option<String>,
    pub street: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub website: Option<String>,
    pub charity_registration_no: Option<String>,
    pub timezone: String,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn filter_food_bank(record: FoodBankRecord, requester_is_admin: bool) -> FoodBankView {
    if requester_is_admin {
        FoodBankView::Full(FoodBankFull {
            id: record.id,
            name: record.name,
            unit_no: record.unit_no,
            street: record.street,
            city: record.city,
            province: record.province,
            country: record.country,
            postal_code: record.postal_code,
            description: record.description,
            email: record.email,
            phone: record.phone,
            fax: record.fax,
            website: record.website,
            charity_registration_no: record.charity_registration_no,
            timezone: record.timezone,
            published: record.published,
            admin: record.admin,
            admin_username: record.admin_username,
            admin_email: record.admin_email,
            created_at: record.created_at,
        })
    } else if record.published {
        FoodBankView::Public(FoodBankPublic {
            id: record.id,
            name: record.name,
            unit_no: record.unit_no,
            street: record.street,
            city: record.city,
            province: record.province,
            country: record.country,
            postal_code: record.postal_code,
            description: record.description,
            email: record.email,
            phone: record.phone,
            fax: record.fax,
            website: record.website,
            charity_registration_no: record.charity_registration_no,
            timezone: record.timezone,
            published: record.published,
            created_at: record.created_at,
        })
    } else {
        FoodBankView::Hidden(Empty {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn record(published: bool) -> FoodBankRecord {
        FoodBankRecord {
            id: Uuid::new_v4(),
            name: "Downtown Food Bank".into(),
            unit_no: Some("4".into()),
            street: "200 Main St".into(),
            city: "Vancouver".into(),
            province: "BC".into(),
            country: "Canada".into(),
            postal_code: "V6B 1A1".into(),
            description: Some("Open to everyone".into()),
            email: Some("contact@dtfb.example.org".into()),
            phone: Some("604-555-0101".into()),
            fax: None,
            website: Some("https://dtfb.example.org".into()),
            charity_registration_no: Some("108082419RR0001".into()),
            timezone: "America/Vancouver".into(),
            published,
            admin: Uuid::new_v4(),
            admin_username: "fb-admin".into(),
            admin_email: "admin@dtfb.example.org".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn as_json(view: FoodBankView) -> Value {
        serde_json::to_value(view).unwrap()
    }

    #[test]
    fn admin_sees_the_admin_identity() {
        let rec = record(true);
        let admin_id = rec.admin;
        let json = as_json(filter_food_bank(rec, true));
        assert_eq!(json["admin"], Value::String(admin_id.to_string()));
        assert_eq!(json["admin_username"], "fb-admin");
        assert_eq!(json["admin_email"], "admin@dtfb.example.org");
    }

    #[test]
    fn admin_sees_an_unpublished_record_in_full() {
        let json = as_json(filter_food_bank(record(false), true));
        assert_eq!(json["name"], "Downtown Food Bank");
        assert_eq!(json["published"], Value::Bool(false));
        assert_eq!(json["admin_username"], "fb-admin");
    }

    #[test]
    fn non_admin_never_sees_admin_keys_on_a_published_record() {
        let json = as_json(filter_food_bank(record(true), false));
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("admin"));
        assert!(!obj.contains_key("admin_username"));
        assert!(!obj.contains_key("admin_email"));
        // the public fields are still all there
        assert_eq!(json["name"], "Downtown Food Bank");
        assert_eq!(json["city"], "Vancouver");
        assert_eq!(json["email"], "contact@dtfb.example.org");
    }

    #[test]
    fn non_admin_gets_an_empty_object_for_an_unpublished_record() {
        let json = as_json(filter_food_bank(record(false), false));
        assert_eq!(json, serde_json::json!({}));
    }
}
