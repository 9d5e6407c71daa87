use std::fmt::Display;
use std::fs::OpenOptions;
use std::str::FromStr;

/// How a file should be opened, parsed from the short mode strings the
/// platform uses (`r`, `w`, `wt`, `wa`, `rw`, `rwt`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub truncate: bool,
    pub append: bool,
}

impl OpenMode {
    pub const READ_ONLY: Self = Self {
        read: true,
        write: false,
        create: false,
        truncate: false,
        append: false,
    };

    pub const WRITE_TRUNCATE: Self = Self {
        read: false,
        write: true,
        create: true,
        truncate: true,
        append: false,
    };

    pub const WRITE_APPEND: Self = Self {
        read: false,
        write: true,
        create: true,
        truncate: false,
        append: true,
    };

    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
        create: true,
        truncate: false,
        append: false,
    };

    pub const READ_WRITE_TRUNCATE: Self = Self {
        read: true,
        write: true,
        create: true,
        truncate: true,
        append: false,
    };

    pub fn parse(mode: &str) -> crate::Result<Self> {
        Ok(match mode {
            "r" => Self::READ_ONLY,
            "w" | "wt" => Self::WRITE_TRUNCATE,
            "wa" => Self::WRITE_APPEND,
            "rw" => Self::READ_WRITE,
            "rwt" => Self::READ_WRITE_TRUNCATE,
            _ => return Err(crate::Error::InvalidOpenMode(mode.into())),
        })
    }

    pub fn to_open_options(&self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        opts.read(self.read)
            .write(self.write)
            .create(self.create)
            .truncate(self.truncate)
            .append(self.append);
        opts
    }
}

impl FromStr for OpenMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for OpenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::with_capacity(3);
        if self.read {
            s.push('r');
        }
        if self.write {
            s.push('w');
        }
        if self.append {
            s.push('a');
        } else if self.truncate {
            s.push('t');
        }
        write!(f, "{}", s)
    }
}
