//! User-facing Persian messages for the live player.

/// Every candidate timed out.
pub const STREAM_UNAVAILABLE: &str = "پخش زنده در حال حاضر در دسترس نیست";

/// Network failure on the last candidate, unrecoverable engine error, or a
/// rejected play request.
pub const PLAYBACK_FAILED: &str = "خطا در پخش ویدیو. لطفاً دوباره تلاش کنید.";

pub const ENGINE_UNSUPPORTED: &str = "مرورگر شما از پخش زنده پشتیبانی نمی‌کند.";

pub const ENGINE_LOAD_FAILED: &str = "خطا در بارگذاری پخش زنده.";
