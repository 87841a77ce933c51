//! Built-in Lua standard library signatures.
//!
//! Covers the base library and the `string`, `table`, `math`, `os`, `io`
//! and `coroutine` tables. Entries are written as Lua definition headers
//! and run through the regular extractor, so they carry the same owner and
//! parameter structure as signatures found in source files.

use std::sync::{Arc, OnceLock};

use crate::cross_file::signatures::{extract_signatures, FunctionSignature};

const BASE: &[&str] = &[
    "assert(v, message)",
    "collectgarbage(opt, arg)",
    "dofile(filename)",
    "error(message, level)",
    "getmetatable(object)",
    "ipairs(t)",
    "load(chunk, chunkname, mode, env)",
    "loadfile(filename, mode, env)",
    "next(table, index)",
    "pairs(t)",
    "pcall(f, ...)",
    "print(...)",
    "rawequal(v1, v2)",
    "rawget(table, index)",
    "rawlen(v)",
    "rawset(table, index, value)",
    "require(modname)",
    "select(index, ...)",
    "setmetatable(table, metatable)",
    "tonumber(e, base)",
    "tostring(v)",
    "type(v)",
    "xpcall(f, msgh, ...)",
];

const STRING: &[&str] = &[
    "byte(s, i, j)",
    "char(...)",
    "dump(func, strip)",
    "find(s, pattern, init, plain)",
    "format(formatstring, ...)",
    "gmatch(s, pattern)",
    "gsub(s, pattern, repl, n)",
    "len(s)",
    "lower(s)",
    "match(s, pattern, init)",
    "pack(fmt, v1, v2, ...)",
    "packsize(fmt)",
    "rep(s, n, sep)",
    "reverse(s)",
    "sub(s, i, j)",
    "unpack(fmt, s, pos)",
    "upper(s)",
];

const TABLE: &[&str] = &[
    "concat(list, sep, i, j)",
    "insert(list, pos, value)",
    "move(a1, f, e, t, a2)",
    "pack(...)",
    "remove(list, pos)",
    "sort(list, comp)",
    "unpack(list, i, j)",
];

const MATH: &[&str] = &[
    "abs(x)",
    "acos(x)",
    "asin(x)",
    "atan(y, x)",
    "ceil(x)",
    "cos(x)",
    "deg(x)",
    "exp(x)",
    "floor(x)",
    "fmod(x, y)",
    "log(x, base)",
    "max(x, ...)",
    "min(x, ...)",
    "modf(x)",
    "rad(x)",
    "random(m, n)",
    "randomseed(x)",
    "sin(x)",
    "sqrt(x)",
    "tan(x)",
    "tointeger(x)",
    "type(x)",
    "ult(m, n)",
];

const OS: &[&str] = &[
    "clock()",
    "date(format, time)",
    "difftime(t2, t1)",
    "execute(command)",
    "exit(code, close)",
    "getenv(varname)",
    "remove(filename)",
    "rename(oldname, newname)",
    "setlocale(locale, category)",
    "time(table)",
    "tmpname()",
];

const IO: &[&str] = &[
    "close(file)",
    "flush()",
    "input(file)",
    "lines(filename, ...)",
    "open(filename, mode)",
    "output(file)",
    "popen(prog, mode)",
    "read(...)",
    "tmpfile()",
    "type(obj)",
    "write(...)",
];

const COROUTINE: &[&str] = &[
    "create(f)",
    "isyieldable()",
    "resume(co, ...)",
    "running()",
    "status(co)",
    "wrap(f)",
    "yield(...)",
];

/// Library tables and their members, in the order they are offered.
const LIBRARIES: &[(Option<&str>, &[&str])] = &[
    (None, BASE),
    (Some("string"), STRING),
    (Some("table"), TABLE),
    (Some("math"), MATH),
    (Some("os"), OS),
    (Some("io"), IO),
    (Some("coroutine"), COROUTINE),
];

/// Names of the standard library tables.
pub fn library_names() -> impl Iterator<Item = &'static str> {
    LIBRARIES.iter().filter_map(|(owner, _)| *owner)
}

/// The built-in signature table, built once.
pub fn builtin_signatures() -> Arc<[FunctionSignature]> {
    static TABLE: OnceLock<Arc<[FunctionSignature]>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            let mut source = String::new();
            for (owner, entries) in LIBRARIES {
                for entry in *entries {
                    source.push_str("function ");
                    if let Some(owner) = owner {
                        source.push_str(owner);
                        source.push('.');
                    }
                    source.push_str(entry);
                    source.push('\n');
                }
            }
            extract_signatures(&source)
                .into_iter()
                .map(|mut sig| {
                    sig.line = 0;
                    sig
                })
                .collect()
        })
        .clone()
}
