#[cfg(test)]
pub const POST_DATA: &str = "---
title: \"What I learned after 20+ years of software development\"
date: 2022-04-02 12:05
slug: what-i-learned
author: thiago
categories: [career]
tags: rust, craft
---

How to be a great software engineer?

Someone asked me this question today and I didn’t have an answer. After thinking for a while, I came up with a list of what I try to do myself.

Disclaimer: I don't think I am a great engineer, but I would love to have listened to that myself when I started my career, over 20 years ago.

<!-- more -->

## Non technical

### Have a honest image of yourself

You finished university and learned a lot. You solved many hard problems.
It's common to think you are awesome and the smartest person in the planet.
";

#[cfg(test)]
pub const POST_WITHOUT_DATE: &str = "---
title: \"How to write a Code Review\"
categories:
slug: code-review
---

There is always those quite obvious things such as don't be a jerk.
";

#[cfg(test)]
pub const PAGE_DATA: &str = "---
layout: page.html
title: \"About me\"
date: 2024-02-27 06:20
url: /about/me/
description: Who writes here
---

## A demo page!

This is a demo page.
";
