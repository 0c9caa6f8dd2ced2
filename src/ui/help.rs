/// Key bindings shown by both renderers: `(keys, description)`.
pub const KEY_HELP: [(&str, &str); 6] = [
    ("q", "Quit"),
    ("r", "Force refresh"),
    ("p / space", "Pause or resume refreshing"),
    ("m", "Switch display mode"),
    ("h / ?", "Toggle this help"),
    ("Esc", "Close help"),
];

pub const FOOTER_HINTS: [(&str, &str); 5] = [
    ("[r] ", "Refresh  "),
    ("[p] ", "Pause  "),
    ("[m] ", "Mode  "),
    ("[h/?] ", "Help  "),
    ("[q] ", "Quit"),
];
