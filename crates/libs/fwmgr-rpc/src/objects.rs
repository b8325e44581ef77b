//! Firewall object CRUD on top of [`Session`].
//!
//! Nothing here adds protocol behaviour: each operation picks a verb, builds
//! the object path under the session's active domain and passes the
//! unwrapped payload (or success marker) straight back.

use crate::envelope::{Method, ParamObject};
use crate::error::{ClientError, Result};
use crate::session::{BatchOutcome, Outcome, Session};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Address,
    AddressGroup,
    Service,
    ServiceGroup,
    Policy,
    Package,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 6] = [
        Self::Address,
        Self::AddressGroup,
        Self::Service,
        Self::ServiceGroup,
        Self::Policy,
        Self::Package,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::AddressGroup => "address-group",
            Self::Service => "service",
            Self::ServiceGroup => "service-group",
            Self::Policy => "policy",
            Self::Package => "package",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|kind| kind.as_str() == normalized).ok_or_else(|| {
            ClientError::invalid_argument(format!("unknown object kind '{}'", raw.trim()))
        })
    }

    /// Name of the key that identifies one object of this kind.
    pub fn key_field(self) -> &'static str {
        match self {
            Self::Policy => "policyid",
            _ => "name",
        }
    }

    pub fn needs_package(self) -> bool {
        self == Self::Policy
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a family of objects lives: the kind plus, for policies, the
/// package that holds them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectTarget {
    pub kind: ObjectKind,
    pub package: Option<String>,
}

impl ObjectTarget {
    pub fn new(kind: ObjectKind) -> Self {
        Self { kind, package: None }
    }

    pub fn in_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Collection path under `adom`.
    pub fn collection_path(&self, adom: &str) -> Result<String> {
        let adom = escape_segment(adom);
        let path = match self.kind {
            ObjectKind::Address => format!("/pm/config/adom/{adom}/obj/firewall/address"),
            ObjectKind::AddressGroup => format!("/pm/config/adom/{adom}/obj/firewall/addrgrp"),
            ObjectKind::Service => {
                format!("/pm/config/adom/{adom}/obj/firewall/service/custom")
            }
            ObjectKind::ServiceGroup => {
                format!("/pm/config/adom/{adom}/obj/firewall/service/group")
            }
            ObjectKind::Policy => {
                let package = self
                    .package
                    .as_deref()
                    .map(str::trim)
                    .filter(|package| !package.is_empty())
                    .ok_or_else(|| {
                        ClientError::invalid_argument("policy operations require a package name")
                    })?;
                format!("/pm/config/adom/{adom}/pkg/{}/firewall/policy", escape_segment(package))
            }
            ObjectKind::Package => format!("/pm/pkg/adom/{adom}"),
        };
        Ok(path)
    }

    pub fn object_path(&self, adom: &str, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::invalid_argument(format!(
                "{} name must not be empty",
                self.kind
            )));
        }
        Ok(format!("{}/{}", self.collection_path(adom)?, escape_segment(name)))
    }
}

/// Object names may contain `/`, which the appliance expects escaped.
fn escape_segment(segment: &str) -> String {
    segment.replace('/', "\\/")
}

impl<T: Transport> Session<T> {
    pub fn list_objects(&mut self, target: &ObjectTarget, fields: &[&str]) -> Result<Vec<JsonValue>> {
        let mut param = ParamObject::new(target.collection_path(self.active_domain())?);
        if !fields.is_empty() {
            param = param.with_fields(fields.iter().copied());
        }
        Ok(match self.exec_param(Method::Get, param)? {
            Outcome::Data(JsonValue::Array(items)) => items,
            Outcome::Data(JsonValue::Null) | Outcome::Done => Vec::new(),
            Outcome::Data(other) => vec![other],
        })
    }

    pub fn get_object(&mut self, target: &ObjectTarget, name: &str) -> Result<Outcome> {
        let path = target.object_path(self.active_domain(), name)?;
        self.exec_param(Method::Get, ParamObject::new(path))
    }

    pub fn add_object(&mut self, target: &ObjectTarget, data: JsonValue) -> Result<Outcome> {
        let path = target.collection_path(self.active_domain())?;
        self.exec_param(Method::Add, ParamObject::new(path).with_data(data))
    }

    /// Creates the object or replaces it wholesale.
    pub fn set_object(&mut self, target: &ObjectTarget, data: JsonValue) -> Result<Outcome> {
        let path = target.collection_path(self.active_domain())?;
        self.exec_param(Method::Set, ParamObject::new(path).with_data(data))
    }

    pub fn update_object(
        &mut self,
        target: &ObjectTarget,
        name: &str,
        data: JsonValue,
    ) -> Result<Outcome> {
        let path = target.object_path(self.active_domain(), name)?;
        self.exec_param(Method::Update, ParamObject::new(path).with_data(data))
    }

    pub fn delete_object(&mut self, target: &ObjectTarget, name: &str) -> Result<Outcome> {
        let path = target.object_path(self.active_domain(), name)?;
        self.exec_param(Method::Delete, ParamObject::new(path))
    }

    /// One `add` per item, submitted together.
    pub fn add_objects(&mut self, target: &ObjectTarget, items: Vec<JsonValue>) -> Result<BatchOutcome> {
        let path = target.collection_path(self.active_domain())?;
        let params =
            items.into_iter().map(|item| ParamObject::new(path.clone()).with_data(item)).collect();
        self.exec_batch(Method::Add, params)
    }

    pub fn delete_objects(&mut self, target: &ObjectTarget, names: &[&str]) -> Result<BatchOutcome> {
        let params = names
            .iter()
            .map(|name| target.object_path(self.active_domain(), name).map(ParamObject::new))
            .collect::<Result<Vec<_>>>()?;
        self.exec_batch(Method::Delete, params)
    }
}
