pub mod orders;
pub mod profiles;

pub use orders::Entity as Orders;
pub use profiles::Entity as Profiles;
