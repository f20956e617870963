// src/models/tenancy.rs

use uuid::Uuid;

use crate::common::error::{AppError, ForbiddenReason};

// ---
// 1. TenantFilter (O "Escopo" de dados)
// ---
// Resultado do resolvedor de tenant: TODA consulta sobre dados de academia
// aplica este filtro antes de qualquer filtro vindo do cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantFilter {
    /// Administrador global: vê todas as academias.
    Unrestricted,
    /// Usuário comum vinculado a uma academia.
    RestrictedTo(Uuid),
    /// Usuário comum SEM academia: não enxerga nada.
    Empty,
}

impl TenantFilter {
    /// O predicado básico: um registro com esta academia está dentro do escopo?
    pub fn matches(&self, academy_id: Option<Uuid>) -> bool {
        match self {
            TenantFilter::Unrestricted => true,
            TenantFilter::RestrictedTo(own) => academy_id == Some(*own),
            TenantFilter::Empty => false,
        }
    }

    /// Mutação sobre um registro existente: o registro precisa estar no escopo.
    /// Compara com o tenant do REGISTRO, nunca com um id enviado pelo cliente.
    pub fn ensure_contains(&self, record_academy: Option<Uuid>) -> Result<(), AppError> {
        if self.matches(record_academy) {
            Ok(())
        } else {
            Err(AppError::Forbidden(ForbiddenReason::TenantMismatch))
        }
    }

    /// (Re)atribuição de academia: só o admin pode mover algo para outra academia
    /// (ou deixá-lo sem academia).
    pub fn ensure_can_assign(&self, target_academy: Option<Uuid>) -> Result<(), AppError> {
        match self {
            TenantFilter::Unrestricted => Ok(()),
            TenantFilter::RestrictedTo(own) if target_academy == Some(*own) => Ok(()),
            _ => Err(AppError::Forbidden(ForbiddenReason::TenantMismatch)),
        }
    }

    /// Constrói o predicado componível para registros em memória.
    pub fn predicate<T: TenantScoped>(&self) -> ScopePredicate<T> {
        ScopePredicate {
            tenant: *self,
            extra: Vec::new(),
        }
    }
}

/// Qualquer entidade que carrega (direta ou indiretamente) um `academy_id`.
pub trait TenantScoped {
    fn academy_id(&self) -> Option<Uuid>;
}

type Check<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

// ---
// 2. ScopePredicate (filtro de tenant + dimensões extras)
// ---
// O tenant é sempre avaliado primeiro; `and` só consegue estreitar.
pub struct ScopePredicate<T> {
    tenant: TenantFilter,
    extra: Vec<Check<T>>,
}

impl<T: TenantScoped> ScopePredicate<T> {
    pub fn and<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.extra.push(Box::new(check));
        self
    }

    pub fn matches(&self, item: &T) -> bool {
        self.tenant.matches(item.academy_id()) && self.extra.iter().all(|check| check(item))
    }

    pub fn filter<I>(&self, items: I) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
    {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Record {
        academy_id: Option<Uuid>,
        coach_id: Option<Uuid>,
    }

    impl TenantScoped for Record {
        fn academy_id(&self) -> Option<Uuid> {
            self.academy_id
        }
    }

    #[test]
    fn empty_scope_matches_nothing_not_even_unassigned_records() {
        let filter = TenantFilter::Empty;
        assert!(!filter.matches(None));
        assert!(!filter.matches(Some(Uuid::new_v4())));
    }

    #[test]
    fn restricted_scope_only_matches_its_own_academy() {
        let own = Uuid::new_v4();
        let filter = TenantFilter::RestrictedTo(own);

        assert!(filter.matches(Some(own)));
        assert!(!filter.matches(Some(Uuid::new_v4())));
        assert!(!filter.matches(None));
    }

    #[test]
    fn cross_tenant_mutation_is_forbidden() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();
        let filter = TenantFilter::RestrictedTo(own);

        assert!(filter.ensure_contains(Some(own)).is_ok());
        assert!(matches!(
            filter.ensure_contains(Some(other)),
            Err(AppError::Forbidden(ForbiddenReason::TenantMismatch))
        ));
        assert!(matches!(
            filter.ensure_can_assign(Some(other)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(filter.ensure_can_assign(None), Err(AppError::Forbidden(_))));
        assert!(TenantFilter::Unrestricted.ensure_can_assign(Some(other)).is_ok());
        assert!(TenantFilter::Empty.ensure_can_assign(Some(own)).is_err());
    }

    #[test]
    fn secondary_dimension_narrows_but_never_widens() {
        let own = Uuid::new_v4();
        let coach = Uuid::new_v4();
        let records = vec![
            Record { academy_id: Some(own), coach_id: Some(coach) },
            Record { academy_id: Some(own), coach_id: None },
            Record { academy_id: Some(Uuid::new_v4()), coach_id: Some(coach) },
        ];

        let visible = TenantFilter::RestrictedTo(own)
            .predicate::<Record>()
            .and(move |r| r.coach_id == Some(coach))
            .filter(records);

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].academy_id, Some(own));

        // Uma condição sempre verdadeira não reabre outras academias
        let widened = TenantFilter::RestrictedTo(own)
            .predicate::<Record>()
            .and(|_| true);
        assert!(!widened.matches(&Record { academy_id: None, coach_id: None }));
    }
}
