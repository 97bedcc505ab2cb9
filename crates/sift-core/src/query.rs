//! Query translation — one chip list, two places to run it.
//!
//! Filter semantics are fixed: values on the same field are OR-ed, distinct
//! fields are AND-ed. [`QueryTranslator::plan`] decides *where* that runs:
//!
//! - **Client**: a [`ClientPredicate`] evaluated over loaded entities with
//!   each field's `match` function. Fields without one pass everything, so
//!   the plan also carries [`ServerParams`] for every chip the remote can
//!   filter, and the fetch must send them.
//! - **Server**: [`ServerParams`] for the remote collection, used only when
//!   the remote declares filter support for every field in play.
//!
//! [`build_query_key`] renders the same chip list into a cache key that does
//! not depend on chip order.

use crate::chips::ChipList;
use crate::registry::{FieldRegistry, ParamStyle, SearchField};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Remote capabilities
// ---------------------------------------------------------------------------

/// Which fields the remote collection can filter on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteCapabilities {
    filterable: BTreeSet<String>,
}

impl RemoteCapabilities {
    /// The remote filters nothing; everything runs client-side.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filterable: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Every field that declares a remote parameter.
    pub fn from_registry<E>(registry: &FieldRegistry<E>) -> Self {
        Self::fields(registry.iter().filter(|f| f.remote.is_some()).map(|f| f.id.clone()))
    }

    pub fn supports(&self, field: &str) -> bool {
        self.filterable.contains(field)
    }
}

// ---------------------------------------------------------------------------
// Server parameters
// ---------------------------------------------------------------------------

/// A single remote parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    List(Vec<String>),
    Scalar(String),
    Flag(bool),
}

/// Remote query parameters, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ServerParams(BTreeMap<String, ParamValue>);

impl ServerParams {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten into `(name, value)` pairs; list values repeat the name.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (name, value) in &self.0 {
            match value {
                ParamValue::List(values) => {
                    pairs.extend(values.iter().map(|v| (name.clone(), v.clone())));
                }
                ParamValue::Scalar(v) => pairs.push((name.clone(), v.clone())),
                ParamValue::Flag(b) => pairs.push((name.clone(), b.to_string())),
            }
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Client predicate
// ---------------------------------------------------------------------------

/// AND across fields of OR across each field's values.
pub struct ClientPredicate<'a, E> {
    clauses: Vec<(&'a SearchField<E>, Vec<String>)>,
}

impl<E> std::fmt::Debug for ClientPredicate<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.clauses.iter().map(|(field, values)| (&field.id, values)))
            .finish()
    }
}

impl<E> ClientPredicate<'_, E> {
    pub fn matches(&self, entity: &E) -> bool {
        self.clauses.iter().all(|(field, values)| {
            !field.has_client_match() || values.iter().any(|v| field.match_entity(entity, v))
        })
    }

    pub fn filter<'e>(&self, entities: &'e [E]) -> Vec<&'e E> {
        entities.iter().filter(|e| self.matches(e)).collect()
    }

    /// Field ids this predicate tests.
    pub fn fields(&self) -> Vec<&str> {
        self.clauses.iter().map(|(f, _)| f.id.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Translator
// ---------------------------------------------------------------------------

/// Where a chip list is evaluated.
#[derive(Debug)]
pub enum QueryPlan<'a, E> {
    /// Filter loaded entities locally. `params` holds the chips the remote
    /// can apply itself; they must go out with the fetch.
    Client {
        predicate: ClientPredicate<'a, E>,
        params: ServerParams,
    },
    Server(ServerParams),
}

impl<E> QueryPlan<'_, E> {
    pub fn is_server(&self) -> bool {
        matches!(self, QueryPlan::Server(_))
    }

    /// Parameters to send to the remote, whichever mode was chosen.
    pub fn server_params(&self) -> &ServerParams {
        match self {
            QueryPlan::Client { params, .. } | QueryPlan::Server(params) => params,
        }
    }
}

/// Compiles chip lists against a registry.
pub struct QueryTranslator<'a, E> {
    registry: &'a FieldRegistry<E>,
}

impl<'a, E> QueryTranslator<'a, E> {
    pub fn new(registry: &'a FieldRegistry<E>) -> Self {
        Self { registry }
    }

    /// Server mode when `caps` covers every field in play, client mode otherwise.
    pub fn plan(&self, chips: &ChipList, caps: &RemoteCapabilities) -> QueryPlan<'a, E> {
        let unsupported: Vec<&str> = chips
            .fields()
            .into_iter()
            .filter(|f| !caps.supports(f))
            .collect();
        if unsupported.is_empty() {
            tracing::debug!(chips = chips.len(), "query plan: server");
            QueryPlan::Server(self.server_params(chips))
        } else {
            tracing::debug!(?unsupported, "query plan: client");
            for id in &unsupported {
                if self.registry.get(id).is_some_and(|f| !f.has_client_match()) {
                    tracing::warn!(field = id, "field has neither a client match nor remote support; its chips filter nothing");
                }
            }
            let remote = chips.retain(|c| caps.supports(&c.field));
            QueryPlan::Client {
                predicate: self.client_predicate(chips),
                params: self.server_params(&remote),
            }
        }
    }

    pub fn client_predicate(&self, chips: &ChipList) -> ClientPredicate<'a, E> {
        let clauses = chips
            .fields()
            .into_iter()
            .filter_map(|id| match self.registry.get(id) {
                Some(field) => {
                    let values = chips.values_for(id).into_iter().map(str::to_string).collect();
                    Some((field, values))
                }
                None => {
                    tracing::warn!(field = id, "ignoring chips on unregistered field");
                    None
                }
            })
            .collect();
        ClientPredicate { clauses }
    }

    /// Remote parameters for `chips`, including the include-all toggles of
    /// every field no chip restricts.
    pub fn server_params(&self, chips: &ChipList) -> ServerParams {
        let mut params = ServerParams::default();

        for field in self.registry.iter() {
            let values: Vec<String> = chips
                .values_for(&field.id)
                .into_iter()
                .map(str::to_string)
                .collect();

            let (name, style) = match &field.remote {
                Some(remote) => {
                    if let Some(toggle) = &remote.include_all {
                        params.insert(toggle.clone(), ParamValue::Flag(values.is_empty()));
                    }
                    (remote.name.clone(), remote.style)
                }
                None => (field.id.clone(), ParamStyle::List),
            };

            if values.is_empty() {
                continue;
            }
            let value = match style {
                ParamStyle::List => ParamValue::List(values),
                ParamStyle::Scalar => {
                    if values.len() > 1 {
                        tracing::debug!(field = %field.id, dropped = values.len() - 1, "scalar parameter keeps the first chip");
                    }
                    ParamValue::Scalar(values[0].clone())
                }
            };
            params.insert(name, value);
        }

        for id in chips.fields() {
            if self.registry.get(id).is_none() {
                tracing::warn!(field = id, "ignoring chips on unregistered field");
            }
        }
        params
    }
}

// ---------------------------------------------------------------------------
// Query key
// ---------------------------------------------------------------------------

/// A cache key for `chips` plus auxiliary toggles (sort direction, "show all
/// owners", ...).
///
/// Chips are rendered as sorted `field:value` strings and toggles as sorted
/// `[name, value]` pairs, so the same logical query always yields the same
/// key regardless of insertion order. A toggle name given twice keeps both
/// values.
pub fn build_query_key<'t, I>(chips: &ChipList, toggles: I) -> String
where
    I: IntoIterator<Item = (&'t str, &'t str)>,
{
    let rendered: BTreeSet<String> = chips.iter().map(|c| c.key()).collect();
    let toggles: BTreeSet<(&str, &str)> = toggles.into_iter().collect();
    serde_json::json!({ "chips": rendered, "toggles": toggles }).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
