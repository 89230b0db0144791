//! Identity-provider integration.
//!
//! Registration, sign-in, and password reset live with the external provider.
//! This side trusts the user id the provider established, mirrors the profile
//! into the store at login, and maps the provider's error codes to Arabic
//! user-facing messages.

/// Identity established upstream by the provider.
///
/// Carried on requests as headers (`X-User-Id`, optional `X-User-Name`)
/// written by the edge that verified the provider session.
#[derive(Debug, Clone)]
pub struct AuthClaims {
    pub user_id: String,
    pub name: Option<String>,
}

/// Fallback for provider error codes with no dedicated message.
pub const UNMAPPED_PROVIDER_MESSAGE: &str = "حدث خطأ غير متوقع، حاولي مرة أخرى";

/// Map a provider error code to its Arabic user-facing message.
///
/// The code set is fixed by the provider; anything unmapped gets the
/// explicit fallback message rather than leaking the raw code.
pub fn localized_provider_message(code: &str) -> &'static str {
    match code {
        "auth/invalid-email" => "البريد الإلكتروني غير صالح",
        "auth/user-not-found" => "لا يوجد حساب بهذا البريد الإلكتروني",
        "auth/wrong-password" => "كلمة المرور غير صحيحة",
        "auth/email-already-in-use" => "هذا البريد الإلكتروني مستخدم بالفعل",
        "auth/weak-password" => "كلمة المرور ضعيفة، استخدمي ست خانات على الأقل",
        "auth/too-many-requests" => "محاولات كثيرة، انتظري قليلاً ثم حاولي مرة أخرى",
        "auth/network-request-failed" => "تعذر الاتصال بالشبكة، تحققي من اتصالك بالإنترنت",
        _ => UNMAPPED_PROVIDER_MESSAGE,
    }
}
