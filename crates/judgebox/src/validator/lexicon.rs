//! Name lists consulted by the static validator.

/// Standalone calls that are always accepted: test-framework globals, keywords that can
/// precede `(`, and common built-ins.
pub const STANDALONE_WHITELIST: &[&str] = &[
    // test framework
    "test",
    "expect",
    "describe",
    "it",
    "beforeEach",
    "afterEach",
    "beforeAll",
    "afterAll",
    // keywords
    "if",
    "for",
    "while",
    "switch",
    "catch",
    "function",
    "return",
    "typeof",
    "async",
    "await",
    "new",
    "super",
    "import",
    "delete",
    "void",
    "yield",
    "do",
    "with",
    "in",
    "of",
    "instanceof",
    "else",
    "case",
    "throw",
    // built-ins
    "require",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "setTimeout",
    "setInterval",
    "clearTimeout",
    "clearInterval",
    "encodeURIComponent",
    "decodeURIComponent",
    "encodeURI",
    "decodeURI",
    "fetch",
    "structuredClone",
    "queueMicrotask",
    "alert",
];

/// Framework names an unknown standalone call is compared against.
pub const KNOWN_KEYWORDS: &[&str] = &["test", "expect", "describe", "it"];

/// Keywords whose misspelled forms (`awaits`, `expectt`) are reported, in scan order.
pub const SENSITIVE_KEYWORDS: &[&str] = &["await", "expect", "test", "async"];

/// Language-level methods ignored by the method scan.
pub const GENERIC_METHODS: &[&str] = &[
    "then",
    "catch",
    "finally",
    "map",
    "filter",
    "forEach",
    "reduce",
    "find",
    "findIndex",
    "some",
    "every",
    "includes",
    "indexOf",
    "push",
    "pop",
    "shift",
    "unshift",
    "slice",
    "splice",
    "join",
    "split",
    "concat",
    "sort",
    "reverse",
    "flat",
    "flatMap",
    "at",
    "trim",
    "trimStart",
    "trimEnd",
    "toLowerCase",
    "toUpperCase",
    "replace",
    "replaceAll",
    "startsWith",
    "endsWith",
    "padStart",
    "padEnd",
    "match",
    "toString",
    "toFixed",
    "stringify",
    "parse",
    "keys",
    "values",
    "entries",
    "assign",
    "from",
    "isArray",
    "log",
    "error",
    "warn",
    "info",
    "debug",
    "now",
    "random",
    "floor",
    "ceil",
    "round",
    "min",
    "max",
    "abs",
    "all",
    "allSettled",
    "race",
    "resolve",
    "reject",
    "call",
    "apply",
    "bind",
    "get",
    "set",
    "has",
    "add",
];

/// Browser-interaction and assertion methods the method scan accepts.
pub const PLAYWRIGHT_METHODS: &[&str] = &[
    // navigation
    "goto",
    "goBack",
    "goForward",
    "reload",
    "waitForURL",
    "waitForLoadState",
    "waitForTimeout",
    "waitForSelector",
    "waitForResponse",
    "waitForRequest",
    "waitForEvent",
    "waitForFunction",
    "url",
    "title",
    "content",
    "setContent",
    "setViewportSize",
    "bringToFront",
    "close",
    "screenshot",
    "pdf",
    "evaluate",
    "evaluateHandle",
    "route",
    "unroute",
    "on",
    "once",
    "off",
    "newPage",
    "newContext",
    "pause",
    "waitForNavigation",
    "setDefaultTimeout",
    "setDefaultNavigationTimeout",
    "emulateMedia",
    "viewportSize",
    "isClosed",
    "addInitScript",
    "exposeFunction",
    "setExtraHTTPHeaders",
    "frames",
    "frame",
    "mainFrame",
    "context",
    "cookies",
    "addCookies",
    "clearCookies",
    "storageState",
    "grantPermissions",
    "clearPermissions",
    // network
    "request",
    "response",
    "status",
    "statusText",
    "ok",
    "json",
    "text",
    "body",
    "headers",
    "allHeaders",
    "headerValue",
    "method",
    "postData",
    "postDataJSON",
    "fetch",
    "post",
    "put",
    "patch",
    "delete",
    "fulfill",
    "continue",
    "abort",
    // dialogs, downloads, file choosers
    "accept",
    "dismiss",
    "message",
    "defaultValue",
    "suggestedFilename",
    "saveAs",
    "path",
    "setFiles",
    // locators
    "locator",
    "getByRole",
    "getByText",
    "getByLabel",
    "getByPlaceholder",
    "getByAltText",
    "getByTitle",
    "getByTestId",
    "frameLocator",
    "first",
    "last",
    "nth",
    "and",
    "or",
    "count",
    "all",
    "$",
    "$$",
    "$eval",
    "$$eval",
    "evaluateAll",
    "waitFor",
    "elementHandle",
    "elementHandles",
    "contentFrame",
    "highlight",
    "ariaSnapshot",
    // actions
    "click",
    "dblclick",
    "fill",
    "clear",
    "type",
    "press",
    "pressSequentially",
    "check",
    "uncheck",
    "setChecked",
    "selectOption",
    "selectText",
    "setInputFiles",
    "hover",
    "focus",
    "blur",
    "tap",
    "dragTo",
    "dispatchEvent",
    "scrollIntoViewIfNeeded",
    "down",
    "up",
    "move",
    "wheel",
    "insertText",
    // state queries
    "textContent",
    "innerText",
    "innerHTML",
    "inputValue",
    "getAttribute",
    "isVisible",
    "isHidden",
    "isEnabled",
    "isDisabled",
    "isChecked",
    "isEditable",
    "boundingBox",
    "allTextContents",
    "allInnerTexts",
    // test structure
    "describe",
    "step",
    "skip",
    "only",
    "fixme",
    "slow",
    "use",
    "beforeEach",
    "afterEach",
    "beforeAll",
    "afterAll",
    "setTimeout",
    "serial",
    "parallel",
    "configure",
    "extend",
    "attach",
    // assertions
    "not",
    "soft",
    "poll",
    "toPass",
    "toBe",
    "toEqual",
    "toStrictEqual",
    "toBeTruthy",
    "toBeFalsy",
    "toBeDefined",
    "toBeUndefined",
    "toBeNull",
    "toBeNaN",
    "toContain",
    "toContainEqual",
    "toHaveLength",
    "toHaveProperty",
    "toMatch",
    "toMatchObject",
    "toBeGreaterThan",
    "toBeGreaterThanOrEqual",
    "toBeLessThan",
    "toBeLessThanOrEqual",
    "toBeCloseTo",
    "toBeInstanceOf",
    "toThrow",
    "toBeVisible",
    "toBeHidden",
    "toBeEnabled",
    "toBeDisabled",
    "toBeChecked",
    "toBeEditable",
    "toBeEmpty",
    "toBeFocused",
    "toBeAttached",
    "toBeInViewport",
    "toHaveText",
    "toContainText",
    "toHaveValue",
    "toHaveValues",
    "toHaveAttribute",
    "toHaveClass",
    "toHaveCSS",
    "toHaveId",
    "toHaveCount",
    "toHaveTitle",
    "toHaveURL",
    "toHaveScreenshot",
    "toHaveAccessibleName",
    "toHaveAccessibleDescription",
    "toHaveRole",
    "toHaveAccessibleErrorMessage",
    "toHaveJSProperty",
    "toBeOK",
    "toMatchSnapshot",
    "toMatchAriaSnapshot",
    "toThrowError",
];
