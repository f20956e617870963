pub mod rbac_repo;
pub use rbac_repo::{RbacRepository, RbacStore};
pub mod tenancy_repo;
pub use tenancy_repo::{AcademyDirectory, TenancyRepository};
pub mod user_repo;
pub use user_repo::{UserRepository, UserStore};
pub mod program_repo;
pub use program_repo::ProgramRepository;
pub mod memory_store;
pub use memory_store::MemoryStore;

pub mod scoped_query;
