// src/openrtb/path.rs

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
}

/// 字段路径，显示为 `imp[0].banner.w` 这样的形式
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Field(name.to_string()));
        next
    }

    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Index(index));
        next
    }

    /// 把相对路径接到当前路径之后
    pub fn join(&self, relative: &FieldPath) -> Self {
        let mut next = self.clone();
        next.segments.extend(relative.segments.iter().cloned());
        next
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// 从 `openrtb.request.item[0]` 形式的字符串构造
    pub fn parse(raw: &str) -> Self {
        let mut path = Self::root();
        for part in raw.split('.').filter(|p| !p.is_empty()) {
            let (name, rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if !name.is_empty() {
                path = path.field(name);
            }
            for index in rest.split('[').filter_map(|s| s.strip_suffix(']')) {
                if let Ok(i) = index.parse() {
                    path = path.index(i);
                }
            }
        }
        path
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
