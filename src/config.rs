use std::env;

/// How double bookings of a (date, time slot) pair are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SlotPolicy {
    /// Confirmed dates are only marked in the picker; nothing is rejected.
    #[default]
    Advisory,
    /// A slot with a confirmed booking rejects new requests and further confirmations.
    FirstConfirmedWins,
}

impl SlotPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "advisory" => Some(SlotPolicy::Advisory),
            "first-confirmed-wins" | "first_confirmed_wins" => Some(SlotPolicy::FirstConfirmedWins),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub backend: String,
    pub database_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub admin_emails: Vec<String>,
    pub slot_policy: SlotPolicy,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let slot_policy = match env::var("SLOT_POLICY") {
            Ok(raw) => SlotPolicy::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "unknown SLOT_POLICY, falling back to advisory");
                SlotPolicy::Advisory
            }),
            Err(_) => SlotPolicy::Advisory,
        };

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            backend: env::var("BACKEND").unwrap_or_else(|_| "local".to_string()),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "autocenter.db".to_string()),
            supabase_url: env::var("SUPABASE_URL").unwrap_or_default(),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            admin_emails: env::var("ADMIN_EMAILS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            slot_policy,
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_policy_parse() {
        assert_eq!(SlotPolicy::parse("advisory"), Some(SlotPolicy::Advisory));
        assert_eq!(
            SlotPolicy::parse(" First-Confirmed-Wins "),
            Some(SlotPolicy::FirstConfirmedWins)
        );
        assert_eq!(SlotPolicy::parse("strict"), None);
    }

    #[test]
    fn test_parse_admin_list() {
        let emails = parse_list("Admin@Shop.com, ,owner@shop.com");
        assert_eq!(emails, vec!["admin@shop.com", "owner@shop.com"]);
    }
}
