/// Prompt for generating a meme tweet from conversational context.
///
/// The `TWEET TEXT:` and `MEME DESCRIPTION:` markers are parsed by the
/// post-meme action, and the closing line doubles as the generation stop
/// sequence. Keep all three verbatim.
pub fn meme_tweet_template(context: &str) -> String {
    format!(
        "You are a creative meme generator. Generate a tweet with an accompanying meme based on the following context:

{context}

Please provide your response in the following format:

TWEET TEXT:
(Write a witty tweet text that works with the meme, max 280 characters)

MEME DESCRIPTION:
(Provide a detailed description for generating the meme image. Be specific about the visual elements, style, and humor)

Make the meme humorous and engaging while staying appropriate for a general audience.

Example response:

TWEET TEXT:
When your code finally works but you don't know why... 🤔 #coding #programming

MEME DESCRIPTION:
Split image meme: Top panel shows a confused programmer staring at working code with question marks floating around. Bottom panel shows the same programmer shrugging with a slight smile, surrounded by celebratory confetti. Bright, colorful style with exaggerated expressions.

Generate a meme tweet now:"
    )
}
