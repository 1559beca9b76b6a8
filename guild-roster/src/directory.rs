//! The guild's member list: who exists, who may log in, who administers.
//!
//! Removing a member only removes their login. Sales, history and matrix cells
//! naming them are left as they are.

use std::{fs, path::Path};

use guild_common::{
    config::LedgerConfig,
    error::{LedgerError, Result},
    Identity, MemberId, Role,
};
use serde::{Deserialize, Serialize};

use crate::member::Member;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDirectory {
    super_admin: MemberId,
    #[serde(default)]
    default_role: Role,
    /// Insertion order is the display order.
    list: Vec<Member>,
}

impl MemberDirectory {
    /// A directory always contains its super admin.
    pub fn new(super_admin: MemberId) -> Self {
        let root = Member::new(super_admin.clone(), "", Role::Admin);
        Self { super_admin, default_role: Role::Member, list: vec![root] }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        let mut dir = Self::new(config.super_admin.clone());
        dir.default_role = config.default_role;
        dir
    }

    /// Adds a member with the directory's default role.
    pub fn enroll(&mut self, who: &Identity, name: &str, password: &str) -> Result<()> {
        let member = Member::new(name.trim(), password, self.default_role);
        self.add_member(who, member)
    }

    pub fn get(&self, name: &MemberId) -> Option<&Member> {
        self.list.iter().find(|m| m.name == *name)
    }

    pub fn names(&self) -> Vec<MemberId> {
        self.list.iter().map(|m| m.name.clone()).collect()
    }

    pub fn members(&self) -> &[Member] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn is_admin(&self, who: &Identity) -> bool {
        match who.member_id() {
            None => false,
            Some(id) if *id == self.super_admin => true,
            Some(id) => self.get(id).map_or(false, Member::is_admin),
        }
    }

    fn require_admin(&self, who: &Identity, action: &str) -> Result<()> {
        if self.is_admin(who) {
            Ok(())
        } else {
            tracing::warn!("🚫 {} attempted {} without admin rights", who, action);
            Err(LedgerError::Unauthorized(format!("{} requires an admin", action)))
        }
    }

    pub fn add_member(&mut self, who: &Identity, member: Member) -> Result<()> {
        self.require_admin(who, "adding members")?;
        member.name.validate()?;
        if self.get(&member.name).is_some() {
            return Err(LedgerError::InvalidInput(format!("member already exists: {}", member.name)));
        }
        tracing::info!("👤 {} added member {} ({:?})", who, member.name, member.role);
        self.list.push(member);
        Ok(())
    }

    pub fn remove_member(&mut self, who: &Identity, name: &MemberId) -> Result<Member> {
        self.require_admin(who, "removing members")?;
        if *name == self.super_admin {
            return Err(LedgerError::InvalidInput(format!("{} is the super admin and cannot be removed", name)));
        }
        let idx = self
            .list
            .iter()
            .position(|m| m.name == *name)
            .ok_or_else(|| LedgerError::NotFound(format!("member {}", name)))?;
        tracing::info!("👤 {} removed member {}", who, name);
        Ok(self.list.remove(idx))
    }

    /// Checks a login attempt and returns the identity to act as.
    pub fn verify_login(&self, name: &MemberId, password: &str) -> Result<Identity> {
        let member = self
            .get(name)
            .ok_or_else(|| LedgerError::NotFound(format!("member {}", name)))?;

        if member.is_open() || member.password == password {
            tracing::info!("🔑 {} logged in", name);
            Ok(Identity::Member(name.clone()))
        } else {
            tracing::warn!("🔒 Wrong password for {}", name);
            Err(LedgerError::Unauthorized("wrong password".to_string()))
        }
    }

    /// Admins may reset anyone; members only themselves.
    pub fn change_password(&mut self, who: &Identity, name: &MemberId, password: &str) -> Result<()> {
        let is_self = who.member_id() == Some(name);
        if !is_self && !self.is_admin(who) {
            return Err(LedgerError::Unauthorized(format!("{} may not change {}'s password", who, name)));
        }
        let member = self
            .list
            .iter_mut()
            .find(|m| m.name == *name)
            .ok_or_else(|| LedgerError::NotFound(format!("member {}", name)))?;
        member.password = password.to_string();
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let dir: MemberDirectory = serde_json::from_str(&data)?;
        if dir.get(&dir.super_admin).is_none() {
            return Err(LedgerError::Config(format!("super admin {} missing from member list", dir.super_admin)));
        }
        Ok(dir)
    }
}
