// src/tasks/lint_js.rs

//! `jshint`: report-only script linting.
//!
//! Syntax errors come from the `swc` parser; on top of a successful parse a
//! small set of rules is checked: `debugger` statements, `with` statements,
//! `eval` calls and loose equality (`==` / `!=`).

use std::path::Path;

use anyhow::Result;
use swc_common::Spanned;
use swc_ecma_ast::{BinExpr, BinaryOp, CallExpr, Callee, DebuggerStmt, Expr, WithStmt};
use swc_ecma_visit::{Visit, VisitWith};

use crate::tasks::{FileError, LintFinding, LintReport, TaskContext, TaskDef, TaskReport, js};

pub fn run(def: &TaskDef, ctx: &TaskContext, report: &mut TaskReport) -> Result<()> {
    for file in def.select(ctx)? {
        report.processed += 1;
        let source = match ctx.fs.read_to_string(&file.path) {
            Ok(s) => s,
            Err(e) => {
                report.errors.push(FileError::new(&file.path, format!("{e:#}")));
                continue;
            }
        };
        let findings = lint(&file.path, &source);
        if !findings.is_empty() {
            report.lint.push(LintReport {
                file: file.rel.clone(),
                findings,
            });
        }
    }
    Ok(())
}

/// Lint one script. Findings are sorted by position.
pub fn lint(path: &Path, source: &str) -> Vec<LintFinding> {
    let parsed = match js::parse(path, source) {
        Ok(parsed) => parsed,
        Err(issue) => {
            return vec![LintFinding {
                line: issue.line,
                column: issue.column,
                rule: "syntax",
                reason: issue.message,
            }];
        }
    };

    let mut findings: Vec<LintFinding> = parsed
        .recovered
        .iter()
        .map(|issue| LintFinding {
            line: issue.line,
            column: issue.column,
            rule: "syntax",
            reason: issue.message.clone(),
        })
        .collect();

    let mut rules = RuleVisitor {
        parsed: &parsed,
        findings: Vec::new(),
    };
    parsed.program.visit_with(&mut rules);
    findings.extend(rules.findings);

    findings.sort_by_key(|f| (f.line, f.column));
    findings
}

struct RuleVisitor<'a> {
    parsed: &'a js::ParsedScript,
    findings: Vec<LintFinding>,
}

impl RuleVisitor<'_> {
    fn push(&mut self, node: &impl Spanned, rule: &'static str, reason: &str) {
        let (line, column) = self.parsed.locate(node.span());
        self.findings.push(LintFinding {
            line,
            column,
            rule,
            reason: reason.to_string(),
        });
    }
}

impl Visit for RuleVisitor<'_> {
    fn visit_debugger_stmt(&mut self, n: &DebuggerStmt) {
        self.push(n, "debug", "Forgotten 'debugger' statement?");
    }

    fn visit_with_stmt(&mut self, n: &WithStmt) {
        self.push(n, "with", "Don't use 'with'.");
        n.visit_children_with(self);
    }

    fn visit_bin_expr(&mut self, n: &BinExpr) {
        match n.op {
            BinaryOp::EqEq => self.push(n, "eqeqeq", "Expected '===' and instead saw '=='."),
            BinaryOp::NotEq => self.push(n, "eqeqeq", "Expected '!==' and instead saw '!='."),
            _ => {}
        }
        n.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, n: &CallExpr) {
        if let Callee::Expr(callee) = &n.callee {
            if let Expr::Ident(ident) = &**callee {
                if &*ident.sym == "eval" {
                    self.push(n, "evil", "eval can be harmful.");
                }
            }
        }
        n.visit_children_with(self);
    }
}
