// Test module - relaxed lint rules
#![allow(clippy::indexing_slicing)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

//! Static validator rules, checked in order.

use judgebox::validator::StaticValidator;
use judgebox::ValidationFinding;

const VALID_SCRIPT: &str =
    "test('x', async ({page}) => { await page.goto('url'); await expect(page).toHaveTitle('t'); });";

fn validate(source: &str) -> Result<(), ValidationFinding> {
    StaticValidator::new().validate(source)
}

fn finding(source: &str) -> ValidationFinding {
    match validate(source) {
        Ok(()) => panic!("expected a finding for {source:?}"),
        Err(finding) => finding,
    }
}

// =============================================================================
// Accepted scripts
// =============================================================================

#[test]
fn minimal_playwright_test_is_valid() {
    assert_eq!(validate(VALID_SCRIPT), Ok(()));
}

#[test]
fn module_imports_are_accepted() {
    let source = "import { test, expect } from '@playwright/test';\n\
                  \n\
                  test('home', async ({ page }) => {\n\
                  \x20 await page.goto('https://example.com');\n\
                  \x20 await expect(page).toHaveTitle(/Example/);\n\
                  });\n";
    assert_eq!(validate(source), Ok(()));
}

#[test]
fn locator_chains_and_generic_helpers_are_accepted() {
    let source = r"
test.describe('login', () => {
  test('submits', async ({ page }) => {
    await page.goto('/login');
    await page.getByLabel('Email').fill('a@b.c');
    await page.getByRole('button', { name: 'Submit' }).click();
    const items = await page.locator('li').allTextContents();
    console.log(items.map((item) => item.trim()).join(', '));
    await expect(page.getByText('Welcome')).toBeVisible();
  });
});
";
    assert_eq!(validate(source), Ok(()));
}

// =============================================================================
// Syntax
// =============================================================================

#[test]
fn unbalanced_brace_is_a_syntax_error() {
    let source = "test('x', async ({ page }) => {\n  await page.goto('/');\n";
    match finding(source) {
        ValidationFinding::SyntaxError { message } => {
            assert!(message.contains("Unexpected end of input"), "{message}");
        }
        other => panic!("unexpected finding {other:?}"),
    }
}

#[test]
fn syntax_error_wins_over_later_findings() {
    assert_eq!(finding("awaits page.clickk(").kind(), "syntax_error");
}

// =============================================================================
// Standalone calls
// =============================================================================

#[test]
fn unrelated_standalone_call_has_no_suggestion() {
    let source = "launchRocket(); test('x', async ({ page }) => { await page.goto('/'); });";
    assert_eq!(
        finding(source),
        ValidationFinding::UnknownStandaloneFunction {
            name: "launchRocket".to_string(),
            suggestion: None,
        }
    );
}

#[test]
fn misspelled_test_suggests_test() {
    let source = "tset('x', async ({ page }) => { await page.goto('/'); });";
    assert_eq!(
        finding(source),
        ValidationFinding::UnknownStandaloneFunction {
            name: "tset".to_string(),
            suggestion: Some("test".to_string()),
        }
    );
}

#[test]
fn misspelled_expect_call_is_caught_as_standalone_call() {
    let source = "test('x', async ({ page }) => { await expectt(page).toHaveURL('/'); });";
    assert_eq!(
        finding(source),
        ValidationFinding::UnknownStandaloneFunction {
            name: "expectt".to_string(),
            suggestion: Some("expect".to_string()),
        }
    );
}

#[test]
fn method_calls_and_constructors_are_not_standalone() {
    let source = "test('x', async ({ page }) => { const d = new Date(); await page.goto(String(d)); });";
    assert_eq!(validate(source), Ok(()));
}

#[test]
fn parenthesized_prose_is_not_a_call() {
    let sources = [
        "test('user can login (happy path)', async ({ page }) => { await page.goto('/'); });",
        "test('opens example.com (home)', async ({ page }) => { await page.goto('https://example.com'); });",
        "// docs at playwright.dev (see intro)\ntest('x', async ({ page }) => { await page.goto('/'); });",
    ];
    for source in sources {
        assert_eq!(validate(source), Ok(()), "{source}");
    }
}

#[test]
fn call_like_text_inside_strings_is_scanned() {
    let source = "test('calls foo() first', async ({ page }) => { await page.goto('/'); });";
    assert_eq!(
        finding(source),
        ValidationFinding::UnknownStandaloneFunction {
            name: "foo".to_string(),
            suggestion: None,
        }
    );
}

// =============================================================================
// Keyword suffixes
// =============================================================================

#[test]
fn awaits_is_flagged_with_await_suggestion() {
    let source = "test('x', async ({ page }) => { awaits page.goto('/'); });";
    assert_eq!(
        finding(source),
        ValidationFinding::UnknownKeyword {
            found: "awaits".to_string(),
            suggestion: "await".to_string(),
        }
    );
}

#[test]
fn keyword_match_ignores_case_of_the_keyword() {
    let source = "test('x', async ({ page }) => { Awaits page.goto('/'); });";
    assert_eq!(
        finding(source),
        ValidationFinding::UnknownKeyword {
            found: "Awaits".to_string(),
            suggestion: "await".to_string(),
        }
    );
}

#[test]
fn exact_keywords_are_never_flagged() {
    for source in [
        VALID_SCRIPT,
        "test('a', async ({ page }) => { await page.goto('/'); await page.reload(); });",
    ] {
        assert_eq!(validate(source), Ok(()), "{source}");
    }
}

// =============================================================================
// Plausibility
// =============================================================================

#[test]
fn sources_without_commands_are_rejected() {
    for source in [
        "",
        "const x = 1;\nconsole.log(x);",
        "let a = [1, 2].map((n) => n * 2);",
        "// test this later\nconst url = 'https://example.com';",
    ] {
        assert_eq!(
            validate(source),
            Err(ValidationFinding::NoRecognizedCommands),
            "{source:?}"
        );
    }
}

#[test]
fn page_reference_alone_is_plausible() {
    assert_eq!(validate("page.goto('/');"), Ok(()));
}

#[test]
fn local_helper_calls_are_flagged() {
    assert_eq!(
        validate("async function run() { await page.goto('/'); }"),
        Err(ValidationFinding::UnknownStandaloneFunction {
            name: "run".to_string(),
            suggestion: None,
        })
    );
}

// =============================================================================
// Methods
// =============================================================================

#[test]
fn clickk_suggests_click() {
    let source = "test('x', async ({ page }) => { await page.locator('#go').clickk(); });";
    let found = finding(source);
    assert_eq!(
        found,
        ValidationFinding::UnknownMethod {
            name: "clickk".to_string(),
            suggestion: Some("click".to_string()),
        }
    );
    let text = found.to_string();
    assert!(text.contains("Unknown method \"clickk\""));
    assert!(text.contains("\"click\""));
}

#[test]
fn unrelated_method_has_no_suggestion() {
    let source = "test('x', async ({ page }) => { await page.zzz(); });";
    assert_eq!(
        finding(source),
        ValidationFinding::UnknownMethod {
            name: "zzz".to_string(),
            suggestion: None,
        }
    );
}

#[test]
fn realistic_scripts_across_the_api_surface_are_accepted() {
    let cases = [
        (
            "api responses",
            r"
import { test, expect } from '@playwright/test';

test('api health', async ({ request }) => {
  const response = await request.get('/api/health');
  await expect(response).toBeOK();
  expect(response.status()).toBe(200);
  expect(response.ok()).toBeTruthy();
  const body = await response.json();
  expect(body).toHaveProperty('status');
  expect(response.headers()['content-type']).toContain('json');
});
",
        ),
        (
            "dialogs",
            r"
test('confirm dialog', async ({ page }) => {
  page.on('dialog', async (dialog) => {
    expect(dialog.message()).toContain('Delete');
    if (dialog.type() === 'confirm') {
      await dialog.accept();
    } else {
      await dialog.dismiss();
    }
  });
  await page.goto('/items');
  await page.getByRole('button', { name: 'Delete' }).click();
});
",
        ),
        (
            "cookies and navigation",
            r"
test('session cookie', async ({ page }) => {
  await page.context().addCookies([{ name: 'session', value: 'abc', url: 'https://example.com' }]);
  await Promise.all([page.waitForNavigation(), page.getByText('Sign in').click()]);
  const cookies = await page.context().cookies();
  expect(cookies.map((c) => c.name)).toContain('session');
  expect(page.frames().length).toBeGreaterThan(0);
});
",
        ),
        (
            "keyboard, mouse and snapshots",
            r"
test('editor', async ({ page }) => {
  await page.goto('/editor');
  await page.keyboard.press('Control+A');
  await page.keyboard.type('hello');
  await page.mouse.click(10, 20);
  await page.mouse.wheel(0, 200);
  const labels = await page.locator('li').evaluateAll((items) => items.map((item) => item.textContent));
  expect(labels).toHaveLength(3);
  await expect(page.locator('#editor')).toHaveJSProperty('spellcheck', false);
  expect(await page.screenshot()).toMatchSnapshot('editor.png');
});
",
        ),
    ];
    for (label, source) in cases {
        assert_eq!(validate(source), Ok(()), "{label}");
    }
}
