// src/compose/request.rs

use std::fmt;

use crate::types::TaskName;

/// A request to run one task or a structured group of tasks.
///
/// Requests nest: an element of a sequence may itself be a parallel group and
/// vice versa.
///
/// ```
/// use assetrun::compose::Request;
///
/// let req = Request::seq([
///     Request::task("clean"),
///     Request::parallel(["fonts", "html"]),
///     Request::task("styles"),
/// ]);
/// assert_eq!(req.to_string(), "[clean, parallel[fonts, html], styles]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// A single task by name.
    Task(TaskName),
    /// Elements run one after another.
    Sequence(Vec<Request>),
    /// Elements run concurrently; the group completes when all of them have.
    Parallel(Vec<Request>),
}

impl Request {
    pub fn task(name: impl Into<TaskName>) -> Self {
        Request::Task(name.into())
    }

    pub fn seq<I, R>(items: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Request>,
    {
        Request::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn parallel<I, R>(items: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Request>,
    {
        Request::Parallel(items.into_iter().map(Into::into).collect())
    }

    /// Every task name referenced by this request, in depth-first order.
    pub fn task_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Request::Task(name) => out.push(name.as_str()),
            Request::Sequence(items) | Request::Parallel(items) => {
                for item in items {
                    item.collect_names(out);
                }
            }
        }
    }
}

impl From<&str> for Request {
    fn from(name: &str) -> Self {
        Request::Task(name.to_string())
    }
}

impl From<String> for Request {
    fn from(name: String) -> Self {
        Request::Task(name)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Task(name) => f.write_str(name),
            Request::Sequence(items) => write_list(f, "", items),
            Request::Parallel(items) => write_list(f, "parallel", items),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, prefix: &str, items: &[Request]) -> fmt::Result {
    write!(f, "{prefix}[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_names_walks_nested_groups_in_order() {
        let req = Request::seq([
            Request::task("clean"),
            Request::parallel([Request::seq(["lint", "scripts"]), Request::task("styles")]),
            Request::task("cache"),
        ]);
        assert_eq!(
            req.task_names(),
            vec!["clean", "lint", "scripts", "styles", "cache"]
        );
    }
}
