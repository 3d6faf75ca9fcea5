//! Sample submissions.
//!
//! The markers `FAIL` and `HANG` steer `judgebox-fake-runner`; the static validator ignores
//! them because they only appear inside comments.

/// Passes both the static validator and the fake runner.
pub const PASSING: &str = r"import { test, expect } from '@playwright/test';

test('homepage has title', async ({ page }) => {
  await page.goto('https://example.com/');
  await expect(page).toHaveTitle(/Example/);
});
";

/// Misspelled locator action; the validator suggests `click`.
pub const MISSPELLED_METHOD: &str = r"test('submit', async ({ page }) => {
  await page.goto('https://example.com/');
  await page.locator('#submit').clickk();
});
";

/// Unbalanced braces.
pub const SYNTAX_ERROR: &str = r"test('broken', async ({ page }) => {
  await page.goto('https://example.com/');
";

/// Makes the fake runner report a failing test and exit 1.
pub const RUNNER_FAILS: &str = r"// FAIL
test('fails', async ({ page }) => {
  await page.goto('https://example.com/');
});
";

/// Makes the fake runner sleep until it is stopped.
pub const RUNNER_HANGS: &str = r"// HANG
test('hangs', async ({ page }) => {
  await page.goto('https://example.com/');
});
";
