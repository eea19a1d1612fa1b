use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::error::ApiError;
use super::gateway::Gateway;
use super::request::ApiRequest;

const INTERVIEWS_PATH: &str = "/interviews/";

/// Wire value enums; `as_str` gives the form used in query strings.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? } default $default:ident) => {
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wire = s.trim().to_lowercase().replace(['-', ' '], "_");
                match wire.as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(format!(
                        "Unknown {} '{}', expected one of: {}",
                        stringify!($name),
                        s,
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }
    };
}

wire_enum!(RoundType {
    Screening => "screening",
    Technical => "technical",
    Hr => "hr",
    Final => "final",
    Offer => "offer",
} default Screening);

wire_enum!(InterviewMode {
    Online => "online",
    Offline => "offline",
    Hybrid => "hybrid",
} default Online);

wire_enum!(Platform {
    Zoom => "zoom",
    Teams => "teams",
    Meet => "meet",
    OnSite => "on_site",
    Phone => "phone",
    Other => "other",
} default Other);

wire_enum!(InterviewStatus {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no_show",
} default Scheduled);

wire_enum!(InterviewResult {
    Waiting => "waiting",
    Selected => "selected",
    Rejected => "rejected",
    OnHold => "on_hold",
} default Waiting);

impl InterviewResult {
    /// A final verdict is only accepted on a completed round
    pub fn requires_completion(&self) -> bool {
        matches!(self, InterviewResult::Selected | InterviewResult::Rejected)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Interview {
    pub id: i64,
    pub company_name: String,
    pub role: String,
    #[serde(default)]
    pub package_offered: String,
    #[serde(default)]
    pub job_url: String,
    #[serde(default)]
    pub hr_name: String,
    #[serde(default)]
    pub hr_contact: String,
    #[serde(default = "first_round")]
    pub round_number: u32,
    #[serde(default)]
    pub round_type: RoundType,
    #[serde(default)]
    pub mode: InterviewMode,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub location: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: InterviewStatus,
    #[serde(default)]
    pub result: InterviewResult,
    #[serde(default)]
    pub prep_notes: String,
    #[serde(default)]
    pub feedback: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn first_round() -> u32 {
    1
}

#[derive(Serialize, Debug, Clone)]
pub struct InterviewInput {
    pub company_name: String,
    pub role: String,
    pub package_offered: String,
    pub job_url: String,
    pub hr_name: String,
    pub hr_contact: String,
    pub round_number: u32,
    pub round_type: RoundType,
    pub mode: InterviewMode,
    pub platform: Platform,
    pub location: String,
    pub scheduled_at: DateTime<Utc>,
    pub follow_up_date: Option<NaiveDate>,
    pub status: InterviewStatus,
    pub result: InterviewResult,
    pub prep_notes: String,
    pub feedback: String,
}

impl InterviewInput {
    pub fn new(company_name: &str, role: &str, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            company_name: company_name.to_string(),
            role: role.to_string(),
            package_offered: String::new(),
            job_url: String::new(),
            hr_name: String::new(),
            hr_contact: String::new(),
            round_number: first_round(),
            round_type: RoundType::default(),
            mode: InterviewMode::default(),
            platform: Platform::default(),
            location: String::new(),
            scheduled_at,
            follow_up_date: None,
            status: InterviewStatus::default(),
            result: InterviewResult::default(),
            prep_notes: String::new(),
            feedback: String::new(),
        }
    }

    /// A selected or rejected verdict is only valid on a completed round
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.result.requires_completion() && self.status != InterviewStatus::Completed {
            return Err(ApiError::Validation {
                status: 400,
                errors: json!({
                    "status": ["Status must be 'completed' when result is selected or rejected."]
                }),
            });
        }
        Ok(())
    }
}

/// Post-round update sent to `add-feedback`; unset fields are untouched
#[derive(Serialize, Debug, Clone, Default)]
pub struct FeedbackInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<InterviewResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InterviewStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct InterviewFilter {
    pub status: Option<InterviewStatus>,
    pub result: Option<InterviewResult>,
    pub round_type: Option<RoundType>,
    pub mode: Option<InterviewMode>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct InterviewSummary {
    pub total: u32,
    pub scheduled: u32,
    pub completed: u32,
    pub selected: u32,
    pub rejected: u32,
    pub on_hold: u32,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompanyRounds {
    pub company_name: String,
    pub total_rounds: u32,
}

fn interview_path(id: i64) -> String {
    format!("{}{}/", INTERVIEWS_PATH, id)
}

pub async fn list(gateway: &Gateway, filter: &InterviewFilter) -> Result<Vec<Interview>, ApiError> {
    let request = ApiRequest::get(INTERVIEWS_PATH)
        .query_opt("status", filter.status)
        .query_opt("result", filter.result)
        .query_opt("round_type", filter.round_type)
        .query_opt("mode", filter.mode)
        .query_opt("search", filter.search.as_deref())
        .query_opt("ordering", filter.ordering.as_deref());
    gateway.send_json(&request).await
}

pub async fn get(gateway: &Gateway, id: i64) -> Result<Interview, ApiError> {
    gateway.send_json(&ApiRequest::get(interview_path(id))).await
}

pub async fn create(gateway: &Gateway, input: &InterviewInput) -> Result<Interview, ApiError> {
    input.validate()?;
    let request = ApiRequest::post(INTERVIEWS_PATH).json(input)?;
    gateway.send_json(&request).await
}

pub async fn update(
    gateway: &Gateway,
    id: i64,
    input: &InterviewInput,
) -> Result<Interview, ApiError> {
    input.validate()?;
    let request = ApiRequest::put(interview_path(id)).json(input)?;
    gateway.send_json(&request).await
}

pub async fn delete(gateway: &Gateway, id: i64) -> Result<(), ApiError> {
    gateway.send_empty(&ApiRequest::delete(interview_path(id))).await
}

/// Scheduled rounds in the next seven days, soonest first
pub async fn upcoming(gateway: &Gateway) -> Result<Vec<Interview>, ApiError> {
    let request = ApiRequest::get(format!("{}upcoming/", INTERVIEWS_PATH));
    gateway.send_json(&request).await
}

/// Record how a round went.
///
/// The feedback endpoint applies no verdict rule, so nothing is checked here.
pub async fn add_feedback(
    gateway: &Gateway,
    id: i64,
    input: &FeedbackInput,
) -> Result<Interview, ApiError> {
    let request = ApiRequest::patch(format!("{}add-feedback/", interview_path(id))).json(input)?;
    gateway.send_json(&request).await
}

pub async fn summary(gateway: &Gateway) -> Result<InterviewSummary, ApiError> {
    let request = ApiRequest::get(format!("{}summary/", INTERVIEWS_PATH));
    gateway.send_json(&request).await
}

pub async fn by_company(gateway: &Gateway) -> Result<Vec<CompanyRounds>, ApiError> {
    let request = ApiRequest::get(format!("{}by-company/", INTERVIEWS_PATH));
    gateway.send_json(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::api::testing::{json_response, ScriptedTransport};
    use crate::modules::session::{MemoryTokenStore, SessionState};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn gateway_with(transport: Arc<ScriptedTransport>) -> Gateway {
        Gateway::new(transport, Arc::new(MemoryTokenStore::new()), SessionState::new())
    }

    fn interview_json(id: i64) -> Value {
        json!({
            "id": id,
            "user": "ada@example.com",
            "company_name": "Acme",
            "role": "Backend Engineer",
            "round_number": 2,
            "round_type": "technical",
            "mode": "online",
            "platform": "meet",
            "scheduled_at": "2026-10-21T10:30:00Z",
            "follow_up_date": null,
            "status": "scheduled",
            "result": "waiting",
            "created_at": "2026-10-10T08:00:00Z",
            "updated_at": "2026-10-10T08:00:00Z"
        })
    }

    #[test]
    fn test_parse_interview() {
        let interview: Interview = serde_json::from_value(interview_json(5)).unwrap();
        assert_eq!(interview.round_type, RoundType::Technical);
        assert_eq!(interview.platform, Platform::Meet);
        assert_eq!(interview.round_number, 2);
        assert_eq!(
            interview.scheduled_at,
            Utc.with_ymd_and_hms(2026, 10, 21, 10, 30, 0).unwrap()
        );
        assert!(interview.hr_name.is_empty());
    }

    #[test]
    fn test_wire_enum_parsing() {
        assert_eq!("no-show".parse::<InterviewStatus>(), Ok(InterviewStatus::NoShow));
        assert_eq!("On Hold".parse::<InterviewResult>(), Ok(InterviewResult::OnHold));
        assert_eq!(Platform::OnSite.to_string(), "on_site");
        let err = "video".parse::<InterviewMode>().unwrap_err();
        assert!(err.contains("online, offline, hybrid"));
    }

    #[test]
    fn test_verdict_requires_completed_status() {
        let mut input = InterviewInput::new("Acme", "SRE", Utc::now());
        input.result = InterviewResult::Selected;
        assert!(matches!(
            input.validate(),
            Err(ApiError::Validation { status: 400, .. })
        ));

        input.status = InterviewStatus::Completed;
        assert!(input.validate().is_ok());

        input.result = InterviewResult::OnHold;
        input.status = InterviewStatus::Scheduled;
        assert!(input.validate().is_ok());
    }

    #[tokio::test]
    async fn test_add_feedback_sends_only_set_fields() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| {
            json_response(200, interview_json(5))
        }));
        let gateway = gateway_with(transport.clone());

        let input = FeedbackInput {
            feedback: Some("Went well".into()),
            ..Default::default()
        };
        add_feedback(&gateway, 5, &input).await.unwrap();

        let call = &transport.calls()[0];
        assert_eq!(call.method, "PATCH");
        assert_eq!(call.path, "/interviews/5/add-feedback/");
        assert_eq!(call.body, Some(json!({"feedback": "Went well"})));
    }

    #[tokio::test]
    async fn test_feedback_verdict_is_left_to_the_server() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| {
            json_response(200, interview_json(5))
        }));
        let gateway = gateway_with(transport.clone());

        let input = FeedbackInput {
            feedback: Some("went ok".into()),
            result: Some(InterviewResult::Selected),
            status: Some(InterviewStatus::Scheduled),
        };
        add_feedback(&gateway, 5, &input).await.unwrap();

        let calls = transport.calls_to("/interviews/5/add-feedback/");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "PATCH");
        assert_eq!(
            calls[0].body,
            Some(json!({"feedback": "went ok", "result": "selected", "status": "scheduled"}))
        );
    }

    #[tokio::test]
    async fn test_crud_paths_and_methods() {
        let transport = Arc::new(ScriptedTransport::new(|request, _| {
            match request.method.as_str() {
                "DELETE" => json_response(204, Value::Null),
                _ => json_response(200, interview_json(5)),
            }
        }));
        let gateway = gateway_with(transport.clone());

        let fetched = get(&gateway, 5).await.unwrap();
        assert_eq!(fetched.company_name, "Acme");

        let mut input = InterviewInput::new("Acme", "Backend Engineer", Utc::now());
        create(&gateway, &input).await.unwrap();

        input.status = InterviewStatus::Completed;
        input.result = InterviewResult::Rejected;
        update(&gateway, 5, &input).await.unwrap();

        delete(&gateway, 5).await.unwrap();

        let sent: Vec<(String, String)> = transport
            .calls()
            .into_iter()
            .map(|call| (call.method, call.path))
            .collect();
        assert_eq!(
            sent,
            vec![
                ("GET".to_string(), "/interviews/5/".to_string()),
                ("POST".to_string(), "/interviews/".to_string()),
                ("PUT".to_string(), "/interviews/5/".to_string()),
                ("DELETE".to_string(), "/interviews/5/".to_string()),
            ]
        );
        let put_body = transport.calls()[2].body.clone().unwrap();
        assert_eq!(put_body["status"], "completed");
        assert_eq!(put_body["result"], "rejected");
    }

    #[tokio::test]
    async fn test_create_and_update_reject_verdict_locally() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| {
            json_response(200, interview_json(5))
        }));
        let gateway = gateway_with(transport.clone());

        let mut input = InterviewInput::new("Acme", "SRE", Utc::now());
        input.result = InterviewResult::Selected;

        let created = create(&gateway, &input).await;
        assert!(matches!(created, Err(ApiError::Validation { status: 400, .. })));
        let updated = update(&gateway, 5, &input).await;
        assert!(matches!(updated, Err(ApiError::Validation { status: 400, .. })));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_summary_and_by_company() {
        let transport = Arc::new(ScriptedTransport::new(|request, _| {
            match request.path.as_str() {
                "/interviews/summary/" => json_response(
                    200,
                    json!({"total": 6, "scheduled": 2, "completed": 4,
                           "selected": 1, "rejected": 2, "on_hold": 1}),
                ),
                "/interviews/by-company/" => json_response(
                    200,
                    json!([{"company_name": "Acme", "total_rounds": 3}]),
                ),
                other => panic!("unexpected path {}", other),
            }
        }));
        let gateway = gateway_with(transport);

        let totals = summary(&gateway).await.unwrap();
        assert_eq!(totals.total, 6);
        assert_eq!(totals.on_hold, 1);

        let companies = by_company(&gateway).await.unwrap();
        assert_eq!(
            companies,
            vec![CompanyRounds { company_name: "Acme".into(), total_rounds: 3 }]
        );
    }
}
