#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aleagent::catalog::{Catalog, QueryEngine, SharedCatalog};
use aleagent::dialogue::{DecisionEngine, DecisionPolicy};
use aleagent::error::CollaboratorError;
use aleagent::services::llm::{ChatMessage, Collaborator, PromptBook};
use async_trait::async_trait;

pub const BEERS_CSV: &str = "\
Id,Name,Beer Full Name,Style,Brewery,Description,ABV,Min IBU,Max IBU,Rating
1,Founder's Porter,Founders Brewing Company Founder's Porter,American Porter,Founders Brewing Company,Dark and rich,6.5,25,45,4.2
2,Two Hearted Ale,Bell's Two Hearted Ale,American IPA,Bell's Brewery,Hoppy,7.0,55,70,4.4
3,Hazy Little Thing,Sierra Nevada Hazy Little Thing,New England IPA,Sierra Nevada Brewing Co.,Juicy,6.7,30,50,4.0
4,Pliny the Elder,Russian River Pliny the Elder,Imperial IPA,Russian River Brewing Company,Double IPA,8.0,65,100,4.7
5,Guinness Draught,Guinness Draught,Irish Dry Stout,Guinness,Creamy,4.2,25,45,3.9
6,Old Rasputin,North Coast Old Rasputin,Russian Imperial Stout,North Coast Brewing Co.,Roasty,9.0,60,90,4.3
7,Bitburger Premium,Bitburger Premium Pils,German Pilsner,Bitburger Brauerei,Crisp,4.8,25,40,3.6
8,Hoegaarden (White),Hoegaarden Wit,Belgian Witbier,Hoegaarden,Citrus,4.9,10,15,3.8
9,Classic Pale,Classic India Pale Ale,India Pale Ale,Old Town Brewery,Classic,5.5,40,60,
10,Mystery Brew,Mystery Brew,American IPA,Founders Brewing Company,Unknown,n/a,?,?,3.0
";

pub fn write_catalog(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("beers.csv");
    std::fs::write(&path, contents).expect("write fixture catalog");
    path
}

pub fn shared_catalog(dir: &Path) -> SharedCatalog {
    let path = write_catalog(dir, BEERS_CSV);
    Catalog::load(path).expect("load fixture catalog").into_shared()
}

/// Replays canned replies in order and counts calls.
pub struct ScriptedCollaborator {
    replies: Mutex<VecDeque<String>>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedCollaborator {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<Vec<ChatMessage>>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl Collaborator for ScriptedCollaborator {
    async fn complete(&self, messages: &[ChatMessage], _max_tokens: u32) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CollaboratorError::Unavailable("script exhausted".to_string()))
    }
}

pub fn policy(max_attempts: u32) -> DecisionPolicy {
    DecisionPolicy {
        attempt_limit: Some(max_attempts),
        evaluation: false,
        include_history: false,
        max_tokens: 200,
    }
}

pub fn engine(catalog: SharedCatalog, replies: &[&str], policy: DecisionPolicy) -> (DecisionEngine, Arc<AtomicUsize>) {
    let collaborator = ScriptedCollaborator::new(replies);
    let calls = collaborator.calls();
    let engine = DecisionEngine::new(
        Box::new(collaborator),
        QueryEngine::new(catalog, 5),
        PromptBook::default(),
        policy,
    );
    (engine, calls)
}

pub fn request_info(slot: &str) -> String {
    format!(r#"{{"action": "request_info", "parameter": "{}"}}"#, slot)
}

pub fn confirmation(intent: &str) -> String {
    format!(r#"{{"action": "confirmation", "parameter": "{}"}}"#, intent)
}
