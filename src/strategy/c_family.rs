//! C-family strategies (heuristic): C, C++, C# and Objective-C
//!
//! One strategy type parameterized by dialect. The dialects share the
//! brace-delimited block model and most of the function shape; they differ
//! in class syntax, import syntax and the language-specific data collected.
//!
//! @module strategy/c_family

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{json, Value};

use super::heuristic::{is_keyword, methods_within, split_parameters, ParamStyle, SourceLines};
use super::{run_steps, ExtractError, ParsingStrategy, StepExtractor};
use crate::index::types::{ClassSymbol, FileAnalysis, FileRecord, FunctionSymbol, ImportKind, ImportRecord};

// =============================================================================
// COMPILED REGEX PATTERNS
// =============================================================================

/// C function definition. Groups: 1 name, 2 parameters
static C_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[\w*]+[ \t*]+)*\**(\w+)\s*\(([^)]*)\)\s*\{").unwrap()
});

/// C struct/union. Groups: 1 typedef, 2 name
static C_STRUCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(typedef\s+)?(?:struct|union)\s+(\w+)?\s*\{").unwrap()
});

static TYPEDEF_SIMPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*typedef\s+[^;{}]+?[\s*]+\(?\**(\w+)\)?(?:\s*\([^;]*\))?\s*;").unwrap());

static TYPEDEF_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\}\s*(\w+)\s*;").unwrap());

static INCLUDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^[ \t]*#\s*(include|import)\s*[<"]([^>"]+)[>"]"#).unwrap());

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#\s*(\w+)").unwrap());

/// C++ function or method. Groups: 1 owning class, 2 name, 3 parameters
static CPP_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:template\s*<[^>]*>\s*)?(?:(?:inline|static|virtual|explicit|constexpr|extern)\s+)*(?:[\w:<>,*&]+[ \t*&]+)*(?:(\w+)::)?(~?\w+)\s*\(([^)]*)\)\s*(?:const\s*)?(?:noexcept\s*)?(?:override\s*)?(?:final\s*)?(?::[^{;]*)?\{",
    )
    .unwrap()
});

/// C++ class/struct. Groups: 1 name, 2 first base
static CPP_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:template\s*<[^>]*>\s*)?(?:class|struct)\s+(?:\w+\s+)?(\w+)(?:\s+final)?(?:\s*:\s*(?:(?:public|private|protected|virtual)\s+)*([\w:]+)[^{;]*)?\s*\{",
    )
    .unwrap()
});

static CPP_NAMESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*namespace\s+([\w:]+)\s*\{").unwrap());

static CPP_TEMPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"template\s*<[^>]*>\s*(?:class|struct)\s+(\w+)").unwrap());

/// C# method. Groups: 1 return type, 2 name, 3 parameters
static CS_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:\[[^\]]*\]\s*)*(?:(?:public|private|protected|internal|static|virtual|override|abstract|sealed|async|extern|unsafe|new|partial)\s+)*([\w.]+(?:<[^(){};]*>)?(?:\[\])?\??)\s+(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)\)\s*(?:where\s+[^{]+?)?\s*(?:\{|=>)",
    )
    .unwrap()
});

/// C# type. Groups: 1 name, 2 first base
static CS_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:\[[^\]]*\]\s*)*(?:(?:public|private|protected|internal|static|abstract|sealed|partial)\s+)*(?:class|interface|struct|record)\s+(\w+)(?:<[^{:]*>)?(?:\s*:\s*([\w.]+)[^{]*?)?\s*\{",
    )
    .unwrap()
});

static CS_USING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:global\s+)?using\s+(?:static\s+)?(?:(\w+)\s*=\s*)?([\w.]+)\s*;").unwrap()
});

static CS_NAMESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*namespace\s+([\w.]+)").unwrap());

static CS_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*\[(\w+)").unwrap());

static CS_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?:public|private|protected|internal|static|virtual|override|abstract|required)\s+)*[\w.<>\[\]?]+\s+(\w+)\s*\{\s*(?:get|set|init)",
    )
    .unwrap()
});

/// Objective-C method. Groups: 1 `-`/`+`, 2 first selector keyword, 3 rest of line
static OBJC_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*([-+])\s*\([^)]*\)\s*(\w+)(.*)$").unwrap());

static OBJC_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s*\([^)]*\)\s*(\w+)").unwrap());

/// Groups: 1 directive, 2 name, 3 superclass
static OBJC_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*@(interface|implementation)\s+(\w+)(?:\s*:\s*(\w+))?").unwrap()
});

static OBJC_PROTOCOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*@protocol\s+(\w+)\s*[^;\w]").unwrap());

static OBJC_MODULE_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*@import\s+([\w.]+)\s*;").unwrap());

/// Names that can appear as `name(...) {` without being a definition
const NOT_FUNCTIONS: &[&str] = &["if", "for", "while", "switch", "catch", "return", "sizeof", "struct", "enum", "union", "namespace", "using", "lock", "foreach", "fixed"];

// =============================================================================
// STRATEGY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    C,
    Cpp,
    CSharp,
    ObjectiveC,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::ObjectiveC => "objective-c",
        }
    }
}

pub struct CFamilyStrategy {
    dialect: Dialect,
}

impl CFamilyStrategy {
    pub fn c() -> Self {
        Self { dialect: Dialect::C }
    }

    pub fn cpp() -> Self {
        Self { dialect: Dialect::Cpp }
    }

    pub fn csharp() -> Self {
        Self { dialect: Dialect::CSharp }
    }

    pub fn objective_c() -> Self {
        Self { dialect: Dialect::ObjectiveC }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

impl ParsingStrategy for CFamilyStrategy {
    fn language(&self) -> &'static str {
        self.dialect.as_str()
    }

    fn extensions(&self) -> &'static [&'static str] {
        match self.dialect {
            Dialect::C => &[".c", ".h"],
            Dialect::Cpp => &[".cpp", ".cc", ".cxx", ".hpp", ".hxx", ".hh"],
            Dialect::CSharp => &[".cs"],
            Dialect::ObjectiveC => &[".m", ".mm"],
        }
    }

    fn analyze(&self, content: &str, file: &FileRecord) -> Result<FileAnalysis, ExtractError> {
        Ok(run_steps(self, &SourceLines::new(content), self.language(), file))
    }
}

impl StepExtractor for CFamilyStrategy {
    type Source<'a> = SourceLines<'a>;

    fn functions(&self, src: &SourceLines<'_>) -> Result<Vec<FunctionSymbol>, ExtractError> {
        let functions = match self.dialect {
            Dialect::C => c_functions(src),
            Dialect::Cpp => cpp_functions(src).into_iter().map(|(_, f)| f).collect(),
            Dialect::CSharp => csharp_functions(src),
            Dialect::ObjectiveC => {
                let mut all = objc_methods(src);
                all.extend(c_functions(src));
                all.sort_by_key(|f| f.line_start);
                all
            }
        };
        Ok(functions)
    }

    fn classes(&self, src: &SourceLines<'_>) -> Result<Vec<ClassSymbol>, ExtractError> {
        let classes = match self.dialect {
            Dialect::C => c_structs(src),
            Dialect::Cpp => cpp_classes(src),
            Dialect::CSharp => {
                let functions = csharp_functions(src);
                declared_classes(src, &CS_CLASS, &functions)
            }
            Dialect::ObjectiveC => objc_classes(src),
        };
        Ok(classes)
    }

    fn imports(&self, src: &SourceLines<'_>) -> Result<Vec<ImportRecord>, ExtractError> {
        let mut imports = Vec::new();

        if self.dialect == Dialect::CSharp {
            for caps in CS_USING.captures_iter(src.content) {
                let Some(module) = caps.get(2) else {
                    continue;
                };
                let mut record = ImportRecord::new(module.as_str(), ImportKind::Using, src.line_of(module.start()));
                if let Some(alias) = caps.get(1) {
                    record.imported_names.push(alias.as_str().to_string());
                }
                imports.push(record);
            }
            return Ok(imports);
        }

        for caps in INCLUDE.captures_iter(src.content) {
            let (Some(directive), Some(path)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let kind = match directive.as_str() {
                "import" => ImportKind::Import,
                _ => ImportKind::Include,
            };
            imports.push(ImportRecord::new(path.as_str(), kind, src.line_of(path.start())));
        }

        if self.dialect == Dialect::ObjectiveC {
            for caps in OBJC_MODULE_IMPORT.captures_iter(src.content) {
                if let Some(module) = caps.get(1) {
                    imports.push(ImportRecord::new(module.as_str(), ImportKind::Import, src.line_of(module.start())));
                }
            }
            imports.sort_by_key(|i| i.line_number);
        }

        Ok(imports)
    }

    fn language_specific(&self, src: &SourceLines<'_>) -> Result<Value, ExtractError> {
        let value = match self.dialect {
            Dialect::C => json!({
                "preprocessor_directives": directives(src),
                "typedefs": typedefs(src),
            }),
            Dialect::Cpp => json!({
                "namespaces": group_one(&CPP_NAMESPACE, src.content),
                "templates": group_one(&CPP_TEMPLATE, src.content),
            }),
            Dialect::CSharp => json!({
                "namespaces": group_one(&CS_NAMESPACE, src.content),
                "attributes": sorted_unique(group_one(&CS_ATTRIBUTE, src.content)),
                "properties": group_one(&CS_PROPERTY, src.content),
            }),
            Dialect::ObjectiveC => {
                let interfaces: Vec<String> = OBJC_CLASS
                    .captures_iter(src.content)
                    .filter(|c| c.get(1).is_some_and(|d| d.as_str() == "interface"))
                    .filter_map(|c| c.get(2).map(|m| m.as_str().to_string()))
                    .collect();
                json!({
                    "interfaces": sorted_unique(interfaces),
                    "protocols": group_one(&OBJC_PROTOCOL, src.content),
                })
            }
        };
        Ok(value)
    }
}

// =============================================================================
// C
// =============================================================================

fn c_functions(src: &SourceLines<'_>) -> Vec<FunctionSymbol> {
    C_FUNCTION
        .captures_iter(src.content)
        .filter_map(|caps| {
            let name = caps.get(1)?;
            if is_excluded(name.as_str()) {
                return None;
            }
            Some(function_at(src, name.start(), name.as_str(), caps.get(2)))
        })
        .collect()
}

fn c_structs(src: &SourceLines<'_>) -> Vec<ClassSymbol> {
    let mut classes = Vec::new();
    for caps in C_STRUCT.captures_iter(src.content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let start = src.line_of(whole.end().saturating_sub(1));
        let end = src.block_end(start);

        let name = match caps.get(2) {
            Some(name) => Some(name.as_str().to_string()),
            // `typedef struct { ... } name;`
            None if caps.get(1).is_some() => TYPEDEF_CLOSE
                .captures(src.line(end))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string()),
            None => None,
        };
        if let Some(name) = name {
            classes.push(ClassSymbol::new(name, start, end));
        }
    }
    classes
}

/// Directive name -> occurrence count
fn directives(src: &SourceLines<'_>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for caps in DIRECTIVE.captures_iter(src.content) {
        if let Some(d) = caps.get(1) {
            *counts.entry(d.as_str().to_string()).or_insert(0) += 1;
        }
    }
    counts
}

fn typedefs(src: &SourceLines<'_>) -> Vec<String> {
    let mut names = group_one(&TYPEDEF_SIMPLE, src.content);
    for class in c_structs(src) {
        let opener = src.line(class.line_start);
        if opener.contains("typedef") {
            if let Some(alias) = TYPEDEF_CLOSE
                .captures(src.line(class.line_end))
                .and_then(|c| c.get(1))
            {
                names.push(alias.as_str().to_string());
            }
        }
    }
    sorted_unique(names)
}

// =============================================================================
// C++
// =============================================================================

/// Functions paired with their out-of-line owner (`Owner::name`)
fn cpp_functions(src: &SourceLines<'_>) -> Vec<(Option<String>, FunctionSymbol)> {
    CPP_FUNCTION
        .captures_iter(src.content)
        .filter_map(|caps| {
            let name = caps.get(2)?;
            if is_excluded(name.as_str()) {
                return None;
            }
            let owner = caps.get(1).map(|m| m.as_str().to_string());
            Some((owner, function_at(src, name.start(), name.as_str(), caps.get(3))))
        })
        .collect()
}

fn cpp_classes(src: &SourceLines<'_>) -> Vec<ClassSymbol> {
    let functions = cpp_functions(src);
    let plain: Vec<FunctionSymbol> = functions.iter().map(|(_, f)| f.clone()).collect();

    let mut classes = declared_classes(src, &CPP_CLASS, &plain);
    for class in &mut classes {
        // Out-of-line definitions: `void Widget::draw() { ... }`
        for (owner, func) in &functions {
            if owner.as_deref() == Some(class.name.as_str()) && !class.methods.contains(&func.name) {
                class.methods.push(func.name.clone());
            }
        }
    }
    classes
}

// =============================================================================
// C#
// =============================================================================

const NOT_RETURN_TYPES: &[&str] = &["new", "return", "else", "await", "throw", "case", "yield", "using"];

fn csharp_functions(src: &SourceLines<'_>) -> Vec<FunctionSymbol> {
    CS_METHOD
        .captures_iter(src.content)
        .filter_map(|caps| {
            let (whole, ret, name) = (caps.get(0)?, caps.get(1)?, caps.get(2)?);
            if is_excluded(name.as_str()) || NOT_RETURN_TYPES.contains(&ret.as_str()) {
                return None;
            }
            let mut func = function_at(src, name.start(), name.as_str(), caps.get(3));
            let prefix = &src.content[whole.start()..name.start()];
            func.is_async = prefix.split_whitespace().any(|w| w == "async");
            func.decorators = group_one(&CS_ATTRIBUTE, prefix);
            Some(func)
        })
        .collect()
}

// =============================================================================
// OBJECTIVE-C
// =============================================================================

fn objc_methods(src: &SourceLines<'_>) -> Vec<FunctionSymbol> {
    let mut methods = Vec::new();
    for caps in OBJC_METHOD.captures_iter(src.content) {
        let (Some(name), Some(rest)) = (caps.get(2), caps.get(3)) else {
            continue;
        };
        // Declarations in @interface/@protocol have no body
        if rest.as_str().trim_end().ends_with(';') {
            continue;
        }
        let start = src.line_of(name.start());
        let mut func = FunctionSymbol::new(name.as_str(), start, src.block_end(start));
        func.parameters = OBJC_PARAM
            .captures_iter(rest.as_str())
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();
        methods.push(func);
    }
    methods
}

/// One class per name: the @implementation span when present, the
/// @interface superclass when declared.
fn objc_classes(src: &SourceLines<'_>) -> Vec<ClassSymbol> {
    let functions = objc_methods(src);
    let mut by_name: BTreeMap<String, ClassSymbol> = BTreeMap::new();
    let mut order: Vec<String> = Vec::new();

    for caps in OBJC_CLASS.captures_iter(src.content) {
        let (Some(directive), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let start = src.line_of(name.start());
        let end = objc_block_end(src, start);
        let base = caps.get(3).map(|m| m.as_str().to_string());

        let mut class = ClassSymbol::new(name.as_str(), start, end);
        class.methods = methods_within(&functions, start, end);

        match by_name.get_mut(name.as_str()) {
            Some(existing) => {
                if directive.as_str() == "implementation" {
                    class.inherits_from = existing.inherits_from.take().or(base);
                    *existing = class;
                } else if existing.inherits_from.is_none() {
                    existing.inherits_from = base;
                }
            }
            None => {
                class.inherits_from = base;
                order.push(name.as_str().to_string());
                by_name.insert(name.as_str().to_string(), class);
            }
        }
    }

    order.into_iter().filter_map(|n| by_name.remove(&n)).collect()
}

/// Line of the `@end` closing a block, or the last line
fn objc_block_end(src: &SourceLines<'_>, start: u32) -> u32 {
    (start..=src.len() as u32)
        .find(|&line| src.line(line).trim_start().starts_with("@end"))
        .unwrap_or(src.len() as u32)
        .max(start)
}

// =============================================================================
// SHARED
// =============================================================================

fn is_excluded(name: &str) -> bool {
    NOT_FUNCTIONS.contains(&name) || is_keyword(name)
}

fn function_at(src: &SourceLines<'_>, offset: usize, name: &str, params: Option<regex::Match<'_>>) -> FunctionSymbol {
    let start = src.line_of(offset);
    let mut func = FunctionSymbol::new(name, start, src.block_end(start));
    func.parameters = params
        .map(|p| split_parameters(p.as_str(), ParamStyle::NameLast))
        .unwrap_or_default();
    func
}

/// Class-like declarations matched by `pattern` (group 1 name, group 2 base)
fn declared_classes(src: &SourceLines<'_>, pattern: &Regex, functions: &[FunctionSymbol]) -> Vec<ClassSymbol> {
    pattern
        .captures_iter(src.content)
        .filter_map(|caps: Captures<'_>| {
            let name = caps.get(1)?;
            let start = src.line_of(name.start());
            let mut class = ClassSymbol::new(name.as_str(), start, src.block_end(start));
            class.inherits_from = caps.get(2).map(|m| m.as_str().to_string());
            class.methods = methods_within(functions, class.line_start, class.line_end);
            Some(class)
        })
        .collect()
}

/// Every capture of group 1, in order
fn group_one(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn sorted_unique(mut items: Vec<String>) -> Vec<String> {
    items.sort();
    items.dedup();
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::tests::record;

    #[test]
    fn test_c_functions_and_structs() {
        let src = r#"#include <stdio.h>
#include "util.h"
#define MAX 10

typedef unsigned long size_type;

struct point {
    int x;
    int y;
};

typedef struct {
    char *name;
} person_t;

static char *dup_name(const char *name, size_t len) {
    if (len > MAX) {
        return NULL;
    }
    return strdup(name);
}

int main(void)
{
    printf("hi\n");
    return 0;
}
"#;
        let analysis = CFamilyStrategy::c().analyze(src, &record("main.c")).unwrap();

        let names: Vec<_> = analysis.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["dup_name", "main"]);
        assert_eq!(analysis.functions[0].parameters, vec!["name", "len"]);
        assert_eq!(analysis.functions[0].line_start, 16);
        assert_eq!(analysis.functions[0].line_end, 21);
        assert!(analysis.functions[1].parameters.is_empty());
        assert_eq!(analysis.functions[1].line_end, 27);

        let classes: Vec<_> = analysis.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(classes, vec!["point", "person_t"]);

        assert_eq!(analysis.imports.len(), 2);
        assert_eq!(analysis.imports[1].module, "util.h");
        assert_eq!(analysis.imports[1].import_type, ImportKind::Include);

        let specific = &analysis.language_specific["c"];
        assert_eq!(specific["preprocessor_directives"]["include"], json!(2));
        assert_eq!(specific["typedefs"], json!(["person_t", "size_type"]));
    }

    #[test]
    fn test_cpp_classes_and_out_of_line_methods() {
        let src = r#"#include <vector>

namespace gfx {

template <typename T>
class Buffer {
};

class Widget : public Base {
public:
    void draw() const {
        paint();
    }
};

void Widget::resize(int w, int h) {
    layout();
}

Widget::~Widget() {
}

}
"#;
        let analysis = CFamilyStrategy::cpp().analyze(src, &record("widget.cpp")).unwrap();

        let widget = analysis.classes.iter().find(|c| c.name == "Widget").unwrap();
        assert_eq!(widget.inherits_from.as_deref(), Some("Base"));
        assert_eq!(widget.methods, vec!["draw", "resize", "~Widget"]);

        let resize = analysis.functions.iter().find(|f| f.name == "resize").unwrap();
        assert_eq!(resize.parameters, vec!["w", "h"]);

        let specific = &analysis.language_specific["cpp"];
        assert_eq!(specific["namespaces"], json!(["gfx"]));
        assert_eq!(specific["templates"], json!(["Buffer"]));
    }

    #[test]
    fn test_csharp() {
        let src = r#"using System;
using IO = System.IO;

namespace App.Services
{
    [Serializable]
    public class OrderService : ServiceBase, IDisposable
    {
        public string Name { get; set; }

        [HttpGet]
        public async Task<List<Order>> LoadAsync(int id, CancellationToken token = default)
        {
            return await repo.Find(id);
        }

        public void Dispose() => repo.Close();
    }
}
"#;
        let analysis = CFamilyStrategy::csharp().analyze(src, &record("OrderService.cs")).unwrap();

        let names: Vec<_> = analysis.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["LoadAsync", "Dispose"]);
        let load = &analysis.functions[0];
        assert!(load.is_async);
        assert_eq!(load.parameters, vec!["id", "token"]);
        assert_eq!(load.decorators, vec!["HttpGet"]);

        let class = &analysis.classes[0];
        assert_eq!(class.name, "OrderService");
        assert_eq!(class.inherits_from.as_deref(), Some("ServiceBase"));
        assert_eq!(class.methods, vec!["LoadAsync", "Dispose"]);

        assert_eq!(analysis.imports.len(), 2);
        assert_eq!(analysis.imports[1].module, "System.IO");
        assert_eq!(analysis.imports[1].imported_names, vec!["IO"]);
        assert_eq!(analysis.imports[1].import_type, ImportKind::Using);

        let specific = &analysis.language_specific["csharp"];
        assert_eq!(specific["namespaces"], json!(["App.Services"]));
        assert_eq!(specific["attributes"], json!(["HttpGet", "Serializable"]));
        assert_eq!(specific["properties"], json!(["Name"]));
    }

    #[test]
    fn test_objective_c() {
        let src = r#"#import <Foundation/Foundation.h>
@import UIKit;

@protocol Greeter <NSObject>
- (void)greet;
@end

@interface Person : NSObject
- (void)setName:(NSString *)name age:(int)age;
@end

@implementation Person
- (void)setName:(NSString *)name age:(int)age {
    _name = name;
}

+ (instancetype)person {
    return [[self alloc] init];
}
@end
"#;
        let analysis = CFamilyStrategy::objective_c().analyze(src, &record("Person.m")).unwrap();

        let names: Vec<_> = analysis.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["setName", "person"]);
        assert_eq!(analysis.functions[0].parameters, vec!["name", "age"]);

        assert_eq!(analysis.classes.len(), 1);
        let person = &analysis.classes[0];
        assert_eq!(person.inherits_from.as_deref(), Some("NSObject"));
        assert_eq!(person.methods, vec!["setName", "person"]);
        assert_eq!(person.line_start, 12);

        assert_eq!(analysis.imports.len(), 2);
        assert_eq!(analysis.imports[1].module, "UIKit");

        let specific = &analysis.language_specific["objective-c"];
        assert_eq!(specific["interfaces"], json!(["Person"]));
        assert_eq!(specific["protocols"], json!(["Greeter"]));
    }
}
