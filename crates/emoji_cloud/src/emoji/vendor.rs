use std::fmt;
use std::str::FromStr;

/// Bitmap style an emoji is drawn in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Vendor {
    Apple,
    Google,
    Meta,
    Windows,
    Twitter,
    JoyPixels,
    Samsung,
    /// Any other asset directory, named verbatim.
    Custom(String),
}

impl Vendor {
    pub const BUNDLED: [Vendor; 7] = [
        Vendor::Apple,
        Vendor::Google,
        Vendor::Meta,
        Vendor::Windows,
        Vendor::Twitter,
        Vendor::JoyPixels,
        Vendor::Samsung,
    ];

    /// Directory name holding this vendor's bitmaps.
    pub fn code(&self) -> &str {
        match self {
            Vendor::Apple => "Appl",
            Vendor::Google => "Goog",
            Vendor::Meta => "FB",
            Vendor::Windows => "Wind",
            Vendor::Twitter => "Twtr",
            Vendor::JoyPixels => "Joy",
            Vendor::Samsung => "Sams",
            Vendor::Custom(code) => code,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Vendor::Apple => "Apple",
            Vendor::Google => "Google",
            Vendor::Meta => "Meta",
            Vendor::Windows => "Windows",
            Vendor::Twitter => "Twitter",
            Vendor::JoyPixels => "JoyPixels",
            Vendor::Samsung => "Samsung",
            Vendor::Custom(code) => code,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Vendor {
    type Err = std::convert::Infallible;

    /// Matches bundled vendors by name or directory code, ignoring case.
    /// Anything else becomes [`Vendor::Custom`].
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let bundled = Vendor::BUNDLED.into_iter().find(|vendor| {
            vendor.name().eq_ignore_ascii_case(value) || vendor.code().eq_ignore_ascii_case(value)
        });
        Ok(bundled.unwrap_or_else(|| Vendor::Custom(value.to_owned())))
    }
}
