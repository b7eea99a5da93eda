/// Instruction sent alongside every drawing.
pub const GUESS_PROMPT: &str = "\
You are playing a drawing guessing game. Look at this hand-drawn sketch and guess what it shows.
Reply with exactly two lines and nothing else:
Line 1: the subject of the drawing in one or two words
Line 2: your confidence, one of: high, medium, low";
