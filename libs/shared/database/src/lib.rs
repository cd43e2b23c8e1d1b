pub mod query;
pub mod supabase;

pub use query::TableQuery;
pub use supabase::SupabaseClient;
