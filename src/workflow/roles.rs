//! Resolución de roles
//!
//! Normaliza etiquetas de rol (mayúsculas, acentos, espacios) y verifica
//! pertenencia a un conjunto permitido. Funciones puras, sin acceso a datos.

use std::fmt;

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::utils::errors::{AppError, AppResult};

/// Roles conocidos del taller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Cliente,
    Mecanico,
    Jefe,
    Admin,
    Recepcionista,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Cliente => "cliente",
            Role::Mecanico => "mecanico",
            Role::Jefe => "jefe",
            Role::Admin => "admin",
            Role::Recepcionista => "recepcionista",
        }
    }

    /// Resolver una etiqueta libre ("Mecánico", " ADMIN ") a un rol
    pub fn parse(label: &str) -> Option<Self> {
        match normalize_role(label).as_str() {
            "cliente" => Some(Role::Cliente),
            "mecanico" => Some(Role::Mecanico),
            "jefe" => Some(Role::Jefe),
            "admin" => Some(Role::Admin),
            "recepcionista" => Some(Role::Recepcionista),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ADMIN: &[&str] = &["admin"];
pub const ADMIN_JEFE: &[&str] = &["admin", "jefe"];
pub const WORKSHOP: &[&str] = &["admin", "mecanico", "jefe"];
pub const FRONT_DESK: &[&str] = &["admin", "recepcionista"];
pub const CAR_INTAKE: &[&str] = &["admin", "recepcionista", "cliente"];
pub const STAFF: &[&str] = &["admin", "mecanico", "jefe", "recepcionista"];
pub const ANY_ROLE: &[&str] = &["admin", "mecanico", "jefe", "recepcionista", "cliente"];

/// Minúsculas, sin acentos ni espacios en los extremos
pub fn normalize_role(label: &str) -> String {
    label
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Verificar si la etiqueta pertenece al conjunto permitido
pub fn has_any_role(label: Option<&str>, allowed: &[&str]) -> bool {
    let Some(role) = label.map(normalize_role).filter(|role| !role.is_empty()) else {
        return false;
    };

    allowed.iter().any(|candidate| normalize_role(candidate) == role)
}

/// Igual que `has_any_role` pero devuelve `Forbidden` al denegar
pub fn require_role(label: Option<&str>, allowed: &[&str]) -> AppResult<()> {
    if has_any_role(label, allowed) {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "Acceso denegado. Roles permitidos: {}",
        allowed.join(", ")
    )))
}
