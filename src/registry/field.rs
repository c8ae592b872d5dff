// src/registry/field.rs

use serde_json::{json, Value};

/// 字段的基础类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    /// 0 | 1 形式的布尔标志
    Flag,
    StringArray,
    IntegerArray,
    NumberArray,
    Object(&'static str),
    ObjectArray(&'static str),
    /// ext：必须是对象，内容从不校验
    Ext,
    /// 不透明对象（Layer-4 的 spec / context / media 等）
    Opaque,
}

impl FieldKind {
    pub fn describe(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Flag => "0|1 flag",
            FieldKind::StringArray => "array of strings",
            FieldKind::IntegerArray => "array of integers",
            FieldKind::NumberArray => "array of numbers",
            FieldKind::Object(_) => "object",
            FieldKind::ObjectArray(_) => "array of objects",
            FieldKind::Ext => "extension object",
            FieldKind::Opaque => "object",
        }
    }

    /// 子实体名
    pub fn entity(&self) -> Option<&'static str> {
        match self {
            FieldKind::Object(name) | FieldKind::ObjectArray(name) => Some(name),
            _ => None,
        }
    }
}

/// 枚举取值域。`exchange_from` 及以上的值属于交易所自定义，视为合法。
#[derive(Debug, PartialEq)]
pub struct EnumDomain {
    pub name: &'static str,
    pub values: &'static [i64],
    pub exchange_from: Option<i64>,
}

impl EnumDomain {
    pub fn contains(&self, value: i64) -> bool {
        self.values.contains(&value) || self.exchange_from.is_some_and(|from| value >= from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    Enum(&'static EnumDomain),
    Range { min: Option<f64>, max: Option<f64> },
}

impl Domain {
    pub const fn range(min: f64, max: f64) -> Self {
        Domain::Range { min: Some(min), max: Some(max) }
    }

    pub const fn at_least(min: f64) -> Self {
        Domain::Range { min: Some(min), max: None }
    }
}

/// 规范化时写入的默认值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Int(i64),
    Str(&'static str),
    StrList(&'static [&'static str]),
}

impl DefaultValue {
    pub fn to_value(&self) -> Value {
        match self {
            DefaultValue::Int(v) => json!(v),
            DefaultValue::Str(s) => json!(s),
            DefaultValue::StrList(list) => json!(list),
        }
    }
}

/// 单个字段的定义
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub domain: Option<Domain>,
    pub default: Option<DefaultValue>,
    pub min_items: usize,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false, domain: None, default: None, min_items: 0 }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn enumerated(self, domain: &'static EnumDomain) -> Self {
        self.domain(Domain::Enum(domain))
    }

    pub fn default_to(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn non_empty(mut self) -> Self {
        self.min_items = 1;
        self
    }
}

/// 跨字段规则
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// 最多出现一个，出现两个以上为错误
    AtMostOne(&'static [&'static str]),
    /// 恰好出现一个
    ExactlyOne(&'static [&'static str]),
    /// 约定互斥：同时出现只给警告
    Advisory(&'static [&'static str]),
}

/// 某个版本下某个实体的全部字段
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    pub entity: &'static str,
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl FieldSet {
    pub fn new(entity: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { entity, fields, rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn required(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// 新增或替换字段（按字段名）
    pub(crate) fn upsert(&mut self, spec: FieldSpec) {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.fields.retain(|f| f.name != name);
    }

    pub(crate) fn replace_rules(&mut self, rules: Vec<Rule>) {
        self.rules = rules;
    }
}
