use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// One requested claim, as the relying-party SDK expects it on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEntry {
    pub claim_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub claim_value: Option<Value>,
}

impl ClaimEntry {
    #[must_use]
    pub fn new(claim_name: &str, claim_value: Option<Value>) -> Self {
        Self {
            claim_name: claim_name.to_string(),
            claim_value,
        }
    }
}

/// The caller's `over18` claim and whether it must be treated as essential.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Over18Descriptor {
    #[schema(value_type = Object)]
    pub over18: Option<Value>,
    #[serde(default)]
    pub is_essential_over18: bool,
}

/// Claim lists for one pushed authorisation request. Built fresh per
/// request and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRequest {
    pub essential: Vec<ClaimEntry>,
    pub voluntary: Vec<ClaimEntry>,
    pub purpose: String,
}

impl ClaimRequest {
    /// Assemble the claim lists, routing an `over18` descriptor into
    /// exactly one of the two lists per its flag and defaulting the purpose
    /// from configuration when the caller omitted it.
    #[must_use]
    pub fn build(
        essential: Vec<ClaimEntry>,
        voluntary: Vec<ClaimEntry>,
        purpose: Option<String>,
        default_purpose: &str,
        over18: Option<&Over18Descriptor>,
    ) -> Self {
        let mut request = Self {
            essential,
            voluntary,
            purpose: purpose
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| default_purpose.to_string()),
        };

        if let Some(descriptor) = over18 {
            if let Some(value) = &descriptor.over18 {
                let entry = ClaimEntry::new("over18", Some(value.clone()));
                if descriptor.is_essential_over18 {
                    request.essential.push(entry);
                } else {
                    request.voluntary.push(entry);
                }
            }
        }

        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_over18_routed_to_essential() {
        let descriptor = Over18Descriptor {
            over18: Some(json!(true)),
            is_essential_over18: true,
        };

        let request = ClaimRequest::build(
            Vec::new(),
            vec![ClaimEntry::new("given_name", None)],
            None,
            "verify your identity",
            Some(&descriptor),
        );

        assert_eq!(
            request.essential,
            vec![ClaimEntry::new("over18", Some(json!(true)))]
        );
        assert_eq!(request.voluntary, vec![ClaimEntry::new("given_name", None)]);
    }

    #[test]
    fn test_over18_routed_to_voluntary() {
        let descriptor = Over18Descriptor {
            over18: Some(json!(true)),
            is_essential_over18: false,
        };

        let request = ClaimRequest::build(
            Vec::new(),
            Vec::new(),
            None,
            "verify your identity",
            Some(&descriptor),
        );

        assert!(request.essential.is_empty());
        assert_eq!(
            request.voluntary,
            vec![ClaimEntry::new("over18", Some(json!(true)))]
        );
    }

    #[test]
    fn test_absent_over18_leaves_lists_unchanged() {
        let request = ClaimRequest::build(
            vec![ClaimEntry::new("family_name", None)],
            Vec::new(),
            None,
            "verify your identity",
            None,
        );

        assert_eq!(request.essential, vec![ClaimEntry::new("family_name", None)]);
        assert!(request.voluntary.is_empty());
    }

    #[test]
    fn test_purpose_defaults_from_configuration() {
        let request =
            ClaimRequest::build(Vec::new(), Vec::new(), None, "age check at checkout", None);
        assert_eq!(request.purpose, "age check at checkout");

        let request = ClaimRequest::build(
            Vec::new(),
            Vec::new(),
            Some("custom purpose".to_string()),
            "age check at checkout",
            None,
        );
        assert_eq!(request.purpose, "custom purpose");

        // An empty purpose is treated as absent
        let request = ClaimRequest::build(
            Vec::new(),
            Vec::new(),
            Some(String::new()),
            "age check at checkout",
            None,
        );
        assert_eq!(request.purpose, "age check at checkout");
    }

    #[test]
    fn test_claim_entry_wire_format() {
        let entry = ClaimEntry::new("over18", Some(json!(true)));
        let wire = serde_json::to_value(&entry).unwrap();
        assert_eq!(wire, json!({ "claimName": "over18", "claimValue": true }));

        let entry = ClaimEntry::new("given_name", None);
        let wire = serde_json::to_value(&entry).unwrap();
        assert_eq!(wire, json!({ "claimName": "given_name" }));
    }
}
