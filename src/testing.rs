//! In-memory collaborators for exercising the page flows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{GatewayError, StoreError};
use crate::gateway::GrantGateway;
use crate::models::{
    Grant, IncomeLevel, Match, MatchResult, NewProfile, PacketFormat, PacketReceipt,
    PacketRequest, Persona, Profile,
};
use crate::store::IdentityStore;

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
    held_get: Mutex<Option<Gate>>,
}

impl MemoryStore {
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// The first `get` waits on the gate; later reads go straight through.
    pub fn holding_first_get(self, gate: Gate) -> Self {
        *self.held_get.lock().unwrap() = Some(gate);
        self
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let held = self.held_get.lock().unwrap().take();
        if let Some(gate) = held {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }
}

/// Pauses one call until released.
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct FakeGateway {
    profiles: Mutex<HashMap<String, Profile>>,
    grants: HashMap<String, Grant>,
    matches: HashMap<String, Vec<MatchResult>>,
    create_failure: Option<String>,
    refresh_failure: Option<String>,
    held_profile: Option<(String, Gate)>,
    created: Mutex<Vec<NewProfile>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, profile: Profile) -> Self {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
        self
    }

    pub fn with_grant(mut self, grant: Grant) -> Self {
        self.grants.insert(grant.id.clone(), grant);
        self
    }

    pub fn with_matches(mut self, profile_id: &str, results: Vec<MatchResult>) -> Self {
        self.matches.insert(profile_id.to_string(), results);
        self
    }

    pub fn failing_create(mut self, message: &str) -> Self {
        self.create_failure = Some(message.to_string());
        self
    }

    pub fn failing_refresh(mut self, message: &str) -> Self {
        self.refresh_failure = Some(message.to_string());
        self
    }

    pub fn holding_profile(mut self, profile_id: &str, gate: Gate) -> Self {
        self.held_profile = Some((profile_id.to_string(), gate));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_profiles(&self) -> Vec<NewProfile> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GrantGateway for FakeGateway {
    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, GatewayError> {
        self.record("create_profile".to_string());
        if let Some(message) = &self.create_failure {
            return Err(GatewayError::Api {
                status: 500,
                message: message.clone(),
            });
        }

        let mut created = self.created.lock().unwrap();
        created.push(profile.clone());
        let stored = Profile {
            id: format!("p{}", created.len()),
            name: profile.name.clone(),
            email: profile.email.clone(),
            persona: profile.persona,
            region: profile.region.clone(),
            gpa: profile.gpa,
            is_minority: profile.is_minority,
            has_disability: profile.has_disability,
            income_level: profile.income_level,
            created_at: None,
            updated_at: None,
        };
        self.profiles
            .lock()
            .unwrap()
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Profile, GatewayError> {
        self.record(format!("get_profile:{profile_id}"));
        if let Some((held, gate)) = &self.held_profile {
            if held == profile_id {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }

        self.profiles
            .lock()
            .unwrap()
            .get(profile_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound("Profile not found".to_string()))
    }

    async fn get_grant(&self, grant_id: &str) -> Result<Grant, GatewayError> {
        self.record(format!("get_grant:{grant_id}"));
        self.grants
            .get(grant_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound("Grant not found".to_string()))
    }

    async fn refresh_matches(
        &self,
        profile_id: &str,
        limit: usize,
    ) -> Result<Vec<MatchResult>, GatewayError> {
        self.record(format!("refresh_matches:{profile_id}:{limit}"));
        if let Some(message) = &self.refresh_failure {
            return Err(GatewayError::Api {
                status: 500,
                message: message.clone(),
            });
        }

        let mut results = self.matches.get(profile_id).cloned().unwrap_or_default();
        results.truncate(limit);
        Ok(results)
    }

    async fn request_packet(&self, request: &PacketRequest) -> Result<PacketReceipt, GatewayError> {
        self.record(format!(
            "request_packet:{}:{}",
            request.profile_id,
            request.grant_ids.join(",")
        ));
        let extension = match request.format {
            PacketFormat::Pdf => "pdf",
            PacketFormat::Docx => "docx",
        };
        let filepath = format!("packets/{}.{extension}", request.profile_id);
        Ok(PacketReceipt {
            message: "Packet generated successfully".to_string(),
            download_url: format!("/packets/download?filepath={filepath}"),
            filepath,
            format: request.format,
        })
    }
}

pub fn sample_profile(id: &str) -> Profile {
    Profile {
        id: id.to_string(),
        name: "Jo Lee".to_string(),
        email: "jo@x.com".to_string(),
        persona: Persona::Student,
        region: "Texas".to_string(),
        gpa: Some(3.8),
        is_minority: false,
        has_disability: false,
        income_level: IncomeLevel::Low,
        created_at: None,
        updated_at: None,
    }
}

pub fn sample_grant(id: &str, title: &str) -> Grant {
    Grant {
        id: id.to_string(),
        title: title.to_string(),
        organization: "Tech Foundation".to_string(),
        amount: 5000.0,
        deadline: "2030-12-31".to_string(),
        description: "Support for STEM students".to_string(),
        url: None,
        eligible_personas: Vec::new(),
        eligible_regions: Vec::new(),
        min_gpa: None,
        income_requirements: Vec::new(),
        requires_minority: false,
        requires_disability: false,
    }
}

pub fn sample_match(profile_id: &str, grant: Grant, score: f64) -> MatchResult {
    MatchResult {
        match_: Match {
            id: None,
            profile_id: profile_id.to_string(),
            grant_id: grant.id.clone(),
            score,
            explanation: format!("{} fits your profile", grant.title),
            created_at: None,
        },
        grant,
    }
}
