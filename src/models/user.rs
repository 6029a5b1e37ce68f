//! Modelo de usuarios y perfiles
//!
//! Un usuario tiene un rol (etiqueta libre, normalizada al comparar) y como
//! máximo un perfil de cliente, mecánico o jefe.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::workflow::roles::Role;

/// Usuario del sistema
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub client_id: Option<Uuid>,
    pub mechanic_id: Option<Uuid>,
    pub boss_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Mecánico y el jefe al que pertenece
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mechanic {
    pub id: Uuid,
    pub user_id: Uuid,
    pub boss_id: Option<Uuid>,
}

/// Jefe de mecánicos
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Boss {
    pub id: Uuid,
    pub user_id: Uuid,
}

/// Cliente dueño de autos
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub user_id: Uuid,
}

/// Datos de contacto del dueño de un auto, para las notificaciones
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContact {
    pub client_id: Uuid,
    pub name: String,
    pub last_name: String,
    pub email: Option<String>,
}

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub role_label: Option<String>,
    pub client_id: Option<Uuid>,
    pub mechanic_id: Option<Uuid>,
    pub boss_id: Option<Uuid>,
}

impl Actor {
    /// Rol resuelto, si la etiqueta corresponde a uno conocido
    pub fn role(&self) -> Option<Role> {
        self.role_label.as_deref().and_then(Role::parse)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    /// Personal del taller (todo rol que no sea cliente)
    pub fn is_staff(&self) -> bool {
        matches!(
            self.role(),
            Some(Role::Admin | Role::Jefe | Role::Mecanico | Role::Recepcionista)
        )
    }
}

impl From<&UserAccount> for Actor {
    fn from(user: &UserAccount) -> Self {
        Self {
            user_id: user.id,
            role_label: Some(user.role.clone()),
            client_id: user.client_id,
            mechanic_id: user.mechanic_id,
            boss_id: user.boss_id,
        }
    }
}
