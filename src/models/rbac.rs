// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

// O que sai do banco (Tabela Roles)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "academy_manager")]
    pub name: String,
}

// As quatro ações possíveis sobre um módulo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "permission_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// O que sai do banco (Tabela Modules)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: Uuid,

    #[schema(example = "programs")]
    pub name: String,

    // Nome exibido no menu (traduzido pela camada de UI)
    #[schema(example = "Programas")]
    pub display_name: Option<String>,

    #[schema(example = "calendar")]
    pub icon: Option<String>,

    #[schema(example = "/programs")]
    pub route: Option<String>,

    pub is_active: bool,
    pub display_order: i32,

    // Telas "meu próprio registro" (perfil do jogador, perfil do treinador).
    // Não são administráveis e nunca entram no menu genérico do admin.
    pub is_self_service: bool,
}

// O que sai do banco (Tabela Permissions, já com o nome do módulo)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,
    pub module_id: Uuid,
    #[schema(example = "programs")]
    pub module_name: String,
    pub action: Action,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleWithPermissions {
    pub module: Module,
    pub permissions: Vec<Permission>,
}

// Payload da substituição em massa (PUT /api/roles/{id}/permissions)
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceRolePermissionsPayload {
    #[schema(example = json!(["550e8400-e29b-41d4-a716-446655440001"]))]
    pub permission_ids: Vec<Uuid>,
}

// Uma entrada do menu de navegação
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[schema(example = "programs")]
    pub name: String,
    #[schema(example = "Programas")]
    pub name_localized: String,
    pub icon: Option<String>,
    #[schema(example = "/programs")]
    pub route: String,
}

impl MenuItem {
    /// Módulos sem rota não viram item de menu.
    pub fn from_module(module: &Module) -> Option<Self> {
        let route = module.route.clone()?;
        Some(Self {
            name: module.name.clone(),
            name_localized: module.display_name.clone().unwrap_or_else(|| module.name.clone()),
            icon: module.icon.clone(),
            route,
        })
    }
}

/// Grafo de permissões de um cargo: módulo -> ações concedidas.
/// Contém apenas módulos ativos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionGraph {
    grants: HashMap<String, HashSet<Action>>,
}

impl PermissionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, module: impl Into<String>, action: Action) {
        self.grants.entry(module.into()).or_default().insert(action);
    }

    pub fn allows(&self, module: &str, action: Action) -> bool {
        self.grants
            .get(module)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// Verdadeiro se o cargo tem QUALQUER ação no módulo.
    pub fn touches(&self, module: &str) -> bool {
        self.grants.get(module).is_some_and(|actions| !actions.is_empty())
    }
}

impl FromIterator<(String, Action)> for PermissionGraph {
    fn from_iter<I: IntoIterator<Item = (String, Action)>>(iter: I) -> Self {
        let mut graph = PermissionGraph::new();
        for (module, action) in iter {
            graph.grant(module, action);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_answers_per_module_and_action() {
        let graph: PermissionGraph = vec![
            ("programs".to_string(), Action::Read),
            ("programs".to_string(), Action::Update),
            ("users".to_string(), Action::Read),
        ]
        .into_iter()
        .collect();

        assert!(graph.allows("programs", Action::Update));
        assert!(!graph.allows("programs", Action::Delete));
        assert!(!graph.allows("medals", Action::Read));
        assert!(graph.touches("users"));
        assert!(!graph.touches("medals"));
    }

    #[test]
    fn menu_item_falls_back_to_module_name() {
        let module = Module {
            id: Uuid::new_v4(),
            name: "health_tests".into(),
            display_name: None,
            icon: Some("heart".into()),
            route: Some("/health-tests".into()),
            is_active: true,
            display_order: 3,
            is_self_service: false,
        };

        let item = MenuItem::from_module(&module).unwrap();
        assert_eq!(item.name_localized, "health_tests");

        let routeless = Module { route: None, ..module };
        assert!(MenuItem::from_module(&routeless).is_none());
    }

    #[test]
    fn action_uses_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&Action::Delete).unwrap(), "\"delete\"");
        let parsed: Action = serde_json::from_str("\"read\"").unwrap();
        assert_eq!(parsed, Action::Read);
    }
}
