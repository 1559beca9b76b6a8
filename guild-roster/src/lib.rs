pub mod directory;
pub mod member;

pub use directory::MemberDirectory;
pub use member::Member;
