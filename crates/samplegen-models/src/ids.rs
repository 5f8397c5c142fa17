//! Well-known property names and model ids.

// System properties.
pub const TYPE: &str = "_t";
pub const SIG: &str = "_s";
pub const SIG_PUB_KEY: &str = "_sigPubKey";
pub const LINK: &str = "_link";
pub const PERMALINK: &str = "_permalink";
pub const AUTHOR: &str = "_author";
pub const PREV_LINK: &str = "_p";
pub const ROOT_LINK: &str = "_r";
pub const TIME: &str = "_time";
pub const VIRTUAL: &str = "_virtual";
pub const DISPLAY_NAME: &str = "_displayName";
pub const AUTHOR_TITLE: &str = "_authorTitle";

/// Bookkeeping properties that never make it into a normalized model.
pub const BOOKKEEPING: &[&str] = &["_cut", "_n", "_q", VIRTUAL];

/// Properties only meaningful on messages.
pub const MESSAGE_ONLY: &[&str] = &["from", "to"];

/// Computed by the synthesizer, never faked property-by-property.
pub const COMPUTED: &[&str] = &[LINK, PERMALINK, AUTHOR, PREV_LINK, ROOT_LINK, VIRTUAL];

/// Always excluded from the hashed payload.
pub const ALWAYS_VIRTUAL: &[&str] = &[LINK, PERMALINK, AUTHOR, VIRTUAL];

// Model ids.
pub const OBJECT: &str = "tradle.Object";
pub const ENUM: &str = "tradle.Enum";
pub const FORM: &str = "tradle.Form";
pub const MESSAGE: &str = "tradle.Message";
pub const FINANCIAL_PRODUCT: &str = "tradle.FinancialProduct";
pub const MY_PRODUCT: &str = "tradle.MyProduct";
pub const MONEY: &str = "tradle.Money";
pub const PHONE: &str = "tradle.Phone";
pub const PHONE_TYPES: &str = "tradle.PhoneTypes";
pub const PHOTO_ID: &str = "tradle.PhotoID";
pub const SELFIE: &str = "tradle.Selfie";
pub const VERIFICATION: &str = "tradle.Verification";
pub const PRODUCT_REQUEST: &str = "tradle.ProductRequest";
pub const FORM_REQUEST: &str = "tradle.FormRequest";
pub const APPLICATION_SUBMITTED: &str = "tradle.ApplicationSubmitted";
pub const APPLICATION_DENIAL: &str = "tradle.ApplicationDenial";
pub const CONFIRMATION: &str = "tradle.Confirmation";
pub const REMEDIATION: &str = "tradle.Remediation";

/// `tradle.CurrentAccount` -> `tradle.MyCurrentAccount`.
pub fn my_product_id(product: &str) -> String {
    match product.split_once('.') {
        Some((ns, name)) => format!("{ns}.My{name}"),
        None => format!("My{product}"),
    }
}
