pub mod db;
pub mod google;
pub mod razorpay;

pub use db::DbAdapter;
pub use google::GoogleIdentityAdapter;
pub use razorpay::RazorpayAdapter;
