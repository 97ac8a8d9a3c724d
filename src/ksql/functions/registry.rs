//! Function Registry
//!
//! Static mapping from host method names to KSQL builtins. Lookups are
//! case-insensitive. Entries flagged as requiring special handling render
//! through an argument template instead of the plain `NAME(args)` form.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::LazyLock;

/// Function categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FunctionCategory {
    String,
    Math,
    Date,
    Aggregate,
    Array,
    Json,
    Cast,
    Conditional,
    Url,
    Geo,
    Crypto,
    Window,
}

impl FunctionCategory {
    pub const ALL: [FunctionCategory; 12] = [
        FunctionCategory::String,
        FunctionCategory::Math,
        FunctionCategory::Date,
        FunctionCategory::Aggregate,
        FunctionCategory::Array,
        FunctionCategory::Json,
        FunctionCategory::Cast,
        FunctionCategory::Conditional,
        FunctionCategory::Url,
        FunctionCategory::Geo,
        FunctionCategory::Crypto,
        FunctionCategory::Window,
    ];
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FunctionCategory::String => "String",
            FunctionCategory::Math => "Math",
            FunctionCategory::Date => "Date",
            FunctionCategory::Aggregate => "Aggregate",
            FunctionCategory::Array => "Array",
            FunctionCategory::Json => "JSON",
            FunctionCategory::Cast => "Cast",
            FunctionCategory::Conditional => "Conditional",
            FunctionCategory::Url => "URL",
            FunctionCategory::Geo => "GEO",
            FunctionCategory::Crypto => "Crypto",
            FunctionCategory::Window => "Window",
        };
        write!(f, "{}", name)
    }
}

/// Result type inferred from an aggregate method name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    Double,
    Bigint,
    Any,
    Array,
    Map,
    Unknown,
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InferredType::Double => "DOUBLE",
            InferredType::Bigint => "BIGINT",
            InferredType::Any => "ANY",
            InferredType::Array => "ARRAY",
            InferredType::Map => "MAP",
            InferredType::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// One registry entry
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionMapping {
    pub host_name: &'static str,
    pub ksql_name: &'static str,
    pub category: FunctionCategory,
    pub is_aggregate: bool,
    pub requires_special_handling: bool,
    /// `{0}`, `{1}`, ... are replaced by the rendered arguments
    pub template: Option<&'static str>,
    /// Template applies only to instance calls (`target.Method(arg)`)
    pub instance_only: bool,
}

impl FunctionMapping {
    fn plain(host_name: &'static str, ksql_name: &'static str, category: FunctionCategory) -> Self {
        Self {
            host_name,
            ksql_name,
            category,
            is_aggregate: false,
            requires_special_handling: false,
            template: None,
            instance_only: false,
        }
    }

    fn aggregate(host_name: &'static str, ksql_name: &'static str) -> Self {
        Self {
            is_aggregate: true,
            ..Self::plain(host_name, ksql_name, FunctionCategory::Aggregate)
        }
    }

    fn special(
        host_name: &'static str,
        ksql_name: &'static str,
        category: FunctionCategory,
        template: &'static str,
    ) -> Self {
        Self {
            requires_special_handling: true,
            template: Some(template),
            ..Self::plain(host_name, ksql_name, category)
        }
    }

    fn instance_only(mut self) -> Self {
        self.instance_only = true;
        self
    }

    fn template_arity(template: &str) -> usize {
        (0..10)
            .take_while(|i| template.contains(&format!("{{{}}}", i)))
            .count()
    }

    /// Render a call with already-rendered arguments
    pub fn render(&self, args: &[String], instance: bool) -> String {
        if let Some(template) = self.template {
            let applies = (!self.instance_only || instance)
                && Self::template_arity(template) == args.len();
            if applies {
                return args
                    .iter()
                    .enumerate()
                    .fold(template.to_string(), |acc, (i, arg)| {
                        acc.replace(&format!("{{{}}}", i), arg)
                    });
            }
        }
        if args.is_empty() && self.is_aggregate {
            return format!("{}(*)", self.ksql_name);
        }
        format!("{}({})", self.ksql_name, args.join(", "))
    }
}

/// Registry of host-method to KSQL function mappings
pub struct FunctionRegistry {
    by_host_name: HashMap<String, FunctionMapping>,
    aggregate_ksql_names: BTreeSet<&'static str>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            by_host_name: HashMap::new(),
            aggregate_ksql_names: BTreeSet::new(),
        };
        registry.register_all_functions();
        registry
    }

    fn register(&mut self, mapping: FunctionMapping) {
        if mapping.is_aggregate {
            self.aggregate_ksql_names.insert(mapping.ksql_name);
        }
        self.by_host_name
            .insert(mapping.host_name.to_uppercase(), mapping);
    }

    fn register_all_functions(&mut self) {
        use FunctionCategory as C;
        use FunctionMapping as F;

        // String functions
        self.register(F::plain("ToUpper", "UPPER", C::String));
        self.register(F::plain("Upper", "UPPER", C::String));
        self.register(F::plain("ToLower", "LOWER", C::String));
        self.register(F::plain("Lower", "LOWER", C::String));
        self.register(F::plain("Trim", "TRIM", C::String));
        self.register(F::plain("TrimStart", "LTRIM", C::String));
        self.register(F::plain("TrimEnd", "RTRIM", C::String));
        self.register(F::plain("Substring", "SUBSTRING", C::String));
        self.register(F::plain("Left", "LEFT", C::String));
        self.register(F::plain("Right", "RIGHT", C::String));
        self.register(F::plain("Replace", "REPLACE", C::String));
        self.register(F::plain("Concat", "CONCAT", C::String));
        self.register(F::plain("Split", "SPLIT", C::String));
        self.register(F::plain("Length", "LEN", C::String));
        self.register(F::plain("PadLeft", "LPAD", C::String));
        self.register(F::plain("PadRight", "RPAD", C::String));
        self.register(F::plain("StartsWith", "STARTS_WITH", C::String));
        self.register(F::plain("EndsWith", "ENDS_WITH", C::String));
        self.register(
            F::special("Contains", "INSTR", C::String, "INSTR({0}, {1}) > 0").instance_only(),
        );
        self.register(
            F::special("IndexOf", "INSTR", C::String, "(INSTR({0}, {1}) - 1)").instance_only(),
        );
        self.register(F::special(
            "IsNullOrEmpty",
            "LEN",
            C::String,
            "({0} IS NULL OR LEN({0}) = 0)",
        ));

        // Math functions
        self.register(F::plain("Abs", "ABS", C::Math));
        self.register(F::plain("Ceiling", "CEIL", C::Math));
        self.register(F::plain("Floor", "FLOOR", C::Math));
        self.register(F::plain("Round", "ROUND", C::Math));
        self.register(F::plain("Sqrt", "SQRT", C::Math));
        self.register(F::plain("Pow", "POWER", C::Math));
        self.register(F::plain("Exp", "EXP", C::Math));
        self.register(F::plain("Log", "LN", C::Math));
        self.register(F::plain("Sign", "SIGN", C::Math));
        self.register(F::plain("Random", "RANDOM", C::Math));

        // Date functions
        self.register(F::plain("Year", "YEAR", C::Date));
        self.register(F::plain("Month", "MONTH", C::Date));
        self.register(F::plain("Day", "DAY", C::Date));
        self.register(F::plain("Hour", "HOUR", C::Date));
        self.register(F::plain("Minute", "MINUTE", C::Date));
        self.register(F::plain("Second", "SECOND", C::Date));
        self.register(F::plain("DayOfWeek", "DAY_OF_WEEK", C::Date));
        self.register(F::plain("DayOfYear", "DAY_OF_YEAR", C::Date));
        self.register(F::plain("WeekOfYear", "WEEK_OF_YEAR", C::Date));
        self.register(F::plain("FormatTimestamp", "FORMAT_TIMESTAMP", C::Date));
        self.register(F::plain("ParseTimestamp", "PARSE_TIMESTAMP", C::Date));
        self.register(F::plain("FormatDate", "FORMAT_DATE", C::Date));
        self.register(F::plain("UnixTimestamp", "UNIX_TIMESTAMP", C::Date));

        // Aggregate functions
        self.register(F::aggregate("Sum", "SUM"));
        self.register(F {
            requires_special_handling: true,
            ..F::aggregate("Count", "COUNT")
        });
        self.register(F::aggregate("Max", "MAX"));
        self.register(F::aggregate("Min", "MIN"));
        self.register(F::aggregate("Average", "AVG"));
        self.register(F::aggregate("Avg", "AVG"));
        self.register(F::aggregate("TopK", "TOPK"));
        self.register(F::aggregate("TopKDistinct", "TOPKDISTINCT"));
        self.register(F::aggregate("Histogram", "HISTOGRAM"));
        self.register(F::aggregate("LatestByOffset", "LATEST_BY_OFFSET"));
        self.register(F::aggregate("EarliestByOffset", "EARLIEST_BY_OFFSET"));
        self.register(F::aggregate("CollectList", "COLLECT_LIST"));
        self.register(F::aggregate("CollectSet", "COLLECT_SET"));
        self.register(F::aggregate("CountDistinct", "COUNT_DISTINCT"));

        // Array functions
        self.register(F::plain("ArrayContains", "ARRAY_CONTAINS", C::Array));
        self.register(F::plain("ArrayLength", "ARRAY_LENGTH", C::Array));
        self.register(F::plain("ArrayDistinct", "ARRAY_DISTINCT", C::Array));
        self.register(F::plain("ArrayJoin", "ARRAY_JOIN", C::Array));
        self.register(F::plain("ArrayMax", "ARRAY_MAX", C::Array));
        self.register(F::plain("ArrayMin", "ARRAY_MIN", C::Array));

        // JSON functions
        self.register(F::plain("JsonExtractString", "EXTRACTJSONFIELD", C::Json));
        self.register(F::plain("JsonArrayLength", "JSON_ARRAY_LENGTH", C::Json));
        self.register(F::plain("JsonKeys", "JSON_KEYS", C::Json));
        self.register(F::plain("ToJsonString", "TO_JSON_STRING", C::Json));

        // Cast functions
        self.register(F::special("ToString", "CAST", C::Cast, "CAST({0} AS VARCHAR)"));
        self.register(F::special("ToInt32", "CAST", C::Cast, "CAST({0} AS INTEGER)"));
        self.register(F::special("ToInt64", "CAST", C::Cast, "CAST({0} AS BIGINT)"));
        self.register(F::special("ToDouble", "CAST", C::Cast, "CAST({0} AS DOUBLE)"));
        self.register(F::special("ToBoolean", "CAST", C::Cast, "CAST({0} AS BOOLEAN)"));

        // Conditional functions
        self.register(F::plain("Coalesce", "COALESCE", C::Conditional));
        self.register(F::plain("IfNull", "IFNULL", C::Conditional));
        self.register(F::plain("NullIf", "NULLIF", C::Conditional));

        // URL functions
        self.register(F::plain("UrlExtractHost", "URL_EXTRACT_HOST", C::Url));
        self.register(F::plain("UrlExtractPath", "URL_EXTRACT_PATH", C::Url));
        self.register(F::plain("UrlExtractQuery", "URL_EXTRACT_QUERY", C::Url));
        self.register(F::plain("UrlExtractParameter", "URL_EXTRACT_PARAMETER", C::Url));
        self.register(F::plain("UrlEncodeParam", "URL_ENCODE_PARAM", C::Url));
        self.register(F::plain("UrlDecodeParam", "URL_DECODE_PARAM", C::Url));

        // GEO functions
        self.register(F::plain("GeoDistance", "GEO_DISTANCE", C::Geo));

        // Crypto / masking functions
        self.register(F::plain("Mask", "MASK", C::Crypto));
        self.register(F::plain("MaskLeft", "MASK_LEFT", C::Crypto));
        self.register(F::plain("MaskRight", "MASK_RIGHT", C::Crypto));
        self.register(F::plain("MaskKeepLeft", "MASK_KEEP_LEFT", C::Crypto));
        self.register(F::plain("MaskKeepRight", "MASK_KEEP_RIGHT", C::Crypto));

        // Window pseudo-columns
        self.register(F::special("WindowStart", "WINDOWSTART", C::Window, "WINDOWSTART"));
        self.register(F::special("WindowEnd", "WINDOWEND", C::Window, "WINDOWEND"));
        self.register(F::special("RowTime", "ROWTIME", C::Window, "ROWTIME"));
    }

    pub fn get(&self, host_name: &str) -> Option<&FunctionMapping> {
        self.by_host_name.get(&host_name.to_uppercase())
    }

    /// Check if a host method name (or KSQL builtin name) is an aggregate
    pub fn is_aggregate_function(&self, name: &str) -> bool {
        let upper = name.to_uppercase();
        self.by_host_name
            .get(&upper)
            .map(|m| m.is_aggregate)
            .unwrap_or_else(|| self.aggregate_ksql_names.contains(upper.as_str()))
    }

    /// KSQL builtin name for a host method, falling back to the upper-cased name
    pub fn ksql_name(&self, host_name: &str) -> String {
        self.get(host_name)
            .map(|m| m.ksql_name.to_string())
            .unwrap_or_else(|| host_name.to_uppercase())
    }

    /// Render a call whose arguments have already been rendered
    pub fn render_call(&self, host_name: &str, args: &[String], instance: bool) -> String {
        match self.get(host_name) {
            Some(mapping) => mapping.render(args, instance),
            None => format!("{}({})", host_name.to_uppercase(), args.join(", ")),
        }
    }

    pub fn infer_type_from_method_name(&self, name: &str) -> InferredType {
        match name.to_uppercase().as_str() {
            "SUM" | "AVG" | "AVERAGE" => InferredType::Double,
            "COUNT" | "COUNTDISTINCT" => InferredType::Bigint,
            "MAX" | "MIN" | "LATESTBYOFFSET" | "EARLIESTBYOFFSET" => InferredType::Any,
            "TOPK" | "TOPKDISTINCT" | "COLLECTLIST" | "COLLECTSET" => InferredType::Array,
            "HISTOGRAM" => InferredType::Map,
            _ => InferredType::Unknown,
        }
    }

    /// Host method names grouped by category, sorted within each category
    pub fn functions_by_category(&self) -> BTreeMap<FunctionCategory, Vec<&'static str>> {
        let mut by_category: BTreeMap<FunctionCategory, Vec<&'static str>> = BTreeMap::new();
        for mapping in self.by_host_name.values() {
            by_category
                .entry(mapping.category)
                .or_default()
                .push(mapping.host_name);
        }
        for names in by_category.values_mut() {
            names.sort_unstable();
        }
        by_category
    }

    pub fn special_handling_functions(&self) -> BTreeSet<&'static str> {
        self.by_host_name
            .values()
            .filter(|m| m.requires_special_handling)
            .map(|m| m.host_name)
            .collect()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global function registry instance
pub static FUNCTION_REGISTRY: LazyLock<FunctionRegistry> = LazyLock::new(FunctionRegistry::new);
